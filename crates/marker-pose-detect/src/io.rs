//! JSON configuration, recorded frames and per-frame reports.

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use marker_pose_core::FrameObservations;
use serde::{Deserialize, Serialize};

use crate::engine::{FrameResult, MarkerSpot};
use crate::params::EngineConfig;
use crate::pose::Pose;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Load a JSON array of recorded frames.
pub fn load_frames_json(path: impl AsRef<Path>) -> Result<Vec<FrameObservations>, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write reports as a pretty JSON array.
pub fn write_reports_json(reports: &[FrameReport], path: impl AsRef<Path>) -> Result<(), IoError> {
    let file = fs::File::create(path)?;
    write_reports_to(reports, BufWriter::new(file))
}

/// Stream reports as a pretty JSON array into `writer`.
pub fn write_reports_to<W: Write>(reports: &[FrameReport], mut writer: W) -> Result<(), IoError> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writer.flush()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportCoordinates {
    pub x: f64,
    pub y: f64,
}

/// One exported marker spot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportObject {
    /// 1-based, in marker order.
    pub id: usize,
    pub color: String,
    /// Relative to the region's top-left corner.
    pub coordinates: ReportCoordinates,
    /// Density score of the spot.
    pub area: f64,
}

/// Export record for one frame, shaped like the `coordinates.json` files
/// downstream consumers already read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Seconds, supplied by the caller.
    pub timestamp: f64,
    pub crop_area: CropArea,
    pub objects: Vec<ReportObject>,
    #[serde(default)]
    pub poses: Vec<Pose>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl ReportObject {
    fn from_spot(id: usize, spot: &MarkerSpot, result: &FrameResult) -> Self {
        let region = &result.region;
        let origin = region.bounds.origin();
        let rx = f64::from(spot.blob.position.x - origin.x);
        let ry = f64::from(spot.blob.position.y - origin.y);
        Self {
            id,
            color: spot.color.clone(),
            coordinates: ReportCoordinates {
                x: round2(rx.clamp(0.0, f64::from(region.width))),
                y: round2(ry.clamp(0.0, f64::from(region.height))),
            },
            area: round2(f64::from(spot.blob.density_score)),
        }
    }
}

impl FrameReport {
    pub fn from_result(result: &FrameResult, timestamp: f64) -> Self {
        let objects = result
            .markers
            .iter()
            .enumerate()
            .map(|(i, spot)| ReportObject::from_spot(i + 1, spot, result))
            .collect();
        Self {
            timestamp,
            crop_area: CropArea {
                width: result.region.width,
                height: result.region.height,
            },
            objects,
            poses: result.poses.clone(),
        }
    }
}
