use std::f32::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marker_pose_core::{BlobObservation, FrameObservations, Hsv};
use marker_pose_detect::{classify, resolve_pairs, EngineConfig, EngineContext, RearCandidates};
use nalgebra::Point2;

fn round_blob(x: i32, y: i32, area: f32, sample: Hsv) -> BlobObservation {
    let r = (area / PI).sqrt();
    BlobObservation::new(Point2::new(x, y), area, 2.0 * PI * r, sample)
}

/// Four vehicles, four corners and a field of unrelated noise blobs.
fn synthetic_frame(noise: usize) -> FrameObservations {
    let corner = Hsv::new(0, 188, 163);
    let front = Hsv::new(114, 255, 150);
    let rears = [
        Hsv::new(72, 255, 60),
        Hsv::new(178, 190, 210),
        Hsv::new(155, 150, 110),
        Hsv::new(11, 160, 255),
    ];

    let mut blobs = Vec::with_capacity(noise + 12);
    for (x, y) in [(20, 20), (1260, 20), (20, 700), (1260, 700)] {
        blobs.push(round_blob(x, y, 40.0, corner));
    }
    for (i, rear) in rears.iter().enumerate() {
        let x = 200 + 250 * i as i32;
        blobs.push(round_blob(x, 300, 320.0, front));
        blobs.push(round_blob(x + 20, 350, 220.0, *rear));
    }
    for i in 0..noise {
        let x = 40 + ((i * 97) % 1200) as i32;
        let y = 40 + ((i * 53) % 640) as i32;
        let sample = Hsv::new(((i * 7) % 180) as u8, ((i * 31) % 256) as u8, ((i * 13) % 256) as u8);
        blobs.push(round_blob(x, y, 20.0 + (i % 200) as f32, sample));
    }
    FrameObservations::new(1280, 720, blobs)
}

fn bench_process_frame(c: &mut Criterion) {
    let frame = synthetic_frame(400);
    let mut engine = EngineConfig::vehicle_fleet_default()
        .and_then(EngineContext::new)
        .expect("default fleet config");

    c.bench_function("process_frame_400_noise", |b| {
        b.iter(|| black_box(engine.process_frame(black_box(&frame))))
    });
}

fn bench_classify(c: &mut Criterion) {
    let config = EngineConfig::vehicle_fleet_default().expect("default fleet config");
    let frame = synthetic_frame(400);

    c.bench_function("classify_412_samples", |b| {
        b.iter(|| {
            frame
                .blobs
                .iter()
                .filter(|blob| classify(black_box(blob.sample), &config.palette).is_some())
                .count()
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    let front: Vec<_> = (0..4).map(|i| Point2::new(100 + 120 * i, 200)).collect();
    let rear: Vec<_> = (0..8)
        .map(|i| RearCandidates::new(format!("Vehicle-{i}"), vec![Point2::new(90 + 60 * i, 240)]))
        .collect();

    c.bench_function("resolve_pairs_8x4", |b| {
        b.iter(|| resolve_pairs(black_box(&front), black_box(&rear), 200.0))
    });
}

criterion_group!(benches, bench_process_frame, bench_classify, bench_resolve);
criterion_main!(benches);
