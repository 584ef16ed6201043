//! Core types for colored-marker pose tracking.
//!
//! This crate is intentionally small and purely descriptive. It knows what an
//! HSV sample, a palette entry and a blob observation look like, but it does
//! *not* classify, score or match anything; that lives in
//! `marker-pose-detect`.
//!
//! Conventions:
//! - hue uses the 0..180 wheel ([`HUE_RANGE`]), saturation and value 0..=255,
//! - pixel coordinates are integer `(x, y)` with `y` growing downwards.

mod color;
mod logger;
mod observation;
mod palette;
mod rect;

pub use color::{hue_distance, ColorProfile, Hsv, HsvTolerance, HUE_RANGE};
pub use observation::{BlobObservation, FrameObservations};
pub use palette::{Palette, PaletteError};
pub use rect::PixelRect;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
