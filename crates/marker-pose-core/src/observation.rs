use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::color::Hsv;

/// One contour reduced by the mask/contour stage.
///
/// `sample` is the HSV value at the centroid. A zero `perimeter` marks a
/// degenerate contour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlobObservation {
    pub position: Point2<i32>,
    pub area: f32,
    #[serde(default)]
    pub perimeter: f32,
    pub sample: Hsv,
}

impl BlobObservation {
    pub fn new(position: Point2<i32>, area: f32, perimeter: f32, sample: Hsv) -> Self {
        Self {
            position,
            area,
            perimeter,
            sample,
        }
    }
}

/// All blob observations extracted from one video frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservations {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub blobs: Vec<BlobObservation>,
}

impl FrameObservations {
    pub fn new(width: u32, height: u32, blobs: Vec<BlobObservation>) -> Self {
        Self {
            width,
            height,
            blobs,
        }
    }
}
