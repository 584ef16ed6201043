//! Marker correspondence and pose engine.
//!
//! Input per frame is a set of [`BlobObservation`](marker_pose_core::BlobObservation)s
//! already reduced from the image by an external mask/contour stage. The
//! engine then:
//! - labels each blob with the closest palette color within tolerance,
//! - locks a detection region from four corner markers and drops blobs
//!   outside it,
//! - scores same-colored blobs by size and roundness, keeping several
//!   separated spots for shared front colors and the best one for rear colors,
//! - pairs front and rear markers per tracked identity, greedily and without
//!   sharing a front marker,
//! - derives heading and marker separation for every resolved pair.
//!
//! ```no_run
//! use marker_pose_detect::{EngineConfig, EngineContext};
//! use marker_pose_core::FrameObservations;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = EngineContext::new(EngineConfig::vehicle_fleet_default()?)?;
//! let frame = FrameObservations::new(640, 480, Vec::new());
//! let result = engine.process_frame(&frame);
//! for pose in result.resolved_poses() {
//!     println!("{}: {:?}", pose.identity, pose.heading_degrees);
//! }
//! # Ok(())
//! # }
//! ```

pub mod blob_score;
pub mod calibration;
pub mod classify;
pub mod correspondence;
pub mod engine;
mod geometry;
pub mod io;
pub mod params;
pub mod pose;
pub mod tracking;

pub use blob_score::{ScoredBlob, SpotSelectionParams};
pub use calibration::{
    CalibrationArea, CalibrationError, CalibrationLocator, CalibrationParams, CornerCandidate,
    DetectionRegion,
};
pub use classify::{classify, ColorClassifier, ColorMatch};
pub use correspondence::{resolve_pairs, Assignment, RearCandidates};
pub use engine::{
    EngineCommand, EngineContext, FrameResult, FrameStats, MarkerRole, MarkerSpot,
};
pub use io::{load_frames_json, write_reports_json, write_reports_to, FrameReport, IoError};
pub use params::{ConfigError, DetectionParams, EngineConfig, TrackedIdentity};
pub use pose::{compute_pose, heading_degrees, Pose};
pub use tracking::{
    FrameSource, SnapshotSlot, TrackedFrame, TrackingHandle, TrackingLoop, TrackingLoopError,
};
