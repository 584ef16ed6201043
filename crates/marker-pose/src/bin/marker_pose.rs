//! Replay recorded frame observations through the marker pose engine.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, LevelFilter};
use marker_pose::detect::{load_frames_json, write_reports_json, write_reports_to};
use marker_pose::{EngineConfig, EngineContext, FrameReport};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "marker-pose")]
#[command(about = "Resolve vehicle poses from colored-marker blob observations")]
#[command(version)]
struct Cli {
    /// Engine configuration (JSON). Defaults to the built-in four-vehicle fleet.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded frames: a JSON array of frame observations.
    #[arg(long, required_unless_present = "write_default_config")]
    frames: Option<PathBuf>,

    /// Where to write the JSON reports. Printed to stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Frame rate used to derive report timestamps.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Write the built-in configuration to this path.
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    if let Some(path) = &cli.write_default_config {
        EngineConfig::vehicle_fleet_default()?.write_json(path)?;
        info!("wrote default config to {}", path.display());
    }

    let Some(frames_path) = &cli.frames else {
        return Ok(());
    };
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("--fps must be positive, got {}", cli.fps).into());
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load_json(path)
            .map_err(|e| -> CliError { format!("failed to load {}: {e}", path.display()).into() })?,
        None => EngineConfig::vehicle_fleet_default()?,
    };
    let reports = run(config, frames_path, cli.fps)?;

    match &cli.output {
        Some(path) => {
            write_reports_json(&reports, path)?;
            info!("wrote {} reports to {}", reports.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_reports_to(&reports, &mut stdout)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn run(config: EngineConfig, frames_path: &Path, fps: f64) -> CliResult<Vec<FrameReport>> {
    let mut engine =
        EngineContext::new(config).map_err(|e| -> CliError { format!("invalid config: {e}").into() })?;
    let frames = load_frames_json(frames_path)
        .map_err(|e| -> CliError { format!("failed to load {}: {e}", frames_path.display()).into() })?;
    info!("replaying {} frames from {}", frames.len(), frames_path.display());

    let mut reports = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let result = engine.process_frame(frame);
        info!(
            "frame {index}: {}/{} resolved, region {}x{}{}",
            result.stats.resolved,
            result.poses.len(),
            result.region.width,
            result.region.height,
            if result.region.is_calibrated() { "" } else { " (full frame)" }
        );
        reports.push(FrameReport::from_result(&result, index as f64 / fps));
    }
    Ok(reports)
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    marker_pose::core::init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    // Either may already be installed; keep whichever is there.
    let _ = tracing_log::LogTracer::init_with_filter(level);
    marker_pose::core::init_tracing(level, false);
    Ok(())
}
