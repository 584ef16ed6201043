//! High-level facade crate for the `marker-pose-*` workspace.
//!
//! Re-exports the core data types and the detection engine under one name,
//! and ships the `marker-pose` command-line tool (feature `cli`) that replays
//! recorded frame observations through the engine.
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_pose::{EngineConfig, EngineContext};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load_json("engine.json")?;
//! let mut engine = EngineContext::new(config)?;
//!
//! let frames = marker_pose::detect::load_frames_json("frames.json")?;
//! for frame in &frames {
//!     let result = engine.process_frame(frame);
//!     println!("{} of {} resolved", result.stats.resolved, result.poses.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_pose::core`: HSV samples, palettes, blob observations, logger.
//! - `marker_pose::detect`: classification, scoring, calibration locking,
//!   correspondence, pose, JSON I/O and the background tracking loop.

pub use marker_pose_core as core;
pub use marker_pose_detect as detect;

pub use marker_pose_core::{
    BlobObservation, ColorProfile, FrameObservations, Hsv, HsvTolerance, Palette,
};
pub use marker_pose_detect::{
    EngineCommand, EngineConfig, EngineContext, FrameReport, FrameResult, Pose, TrackedIdentity,
};
