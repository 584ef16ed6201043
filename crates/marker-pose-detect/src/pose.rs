//! Heading and separation from a front/rear marker pair.
//!
//! Heading is measured in image coordinates: 0° means the front marker sits
//! directly above the rear one, angles grow clockwise, range `[0, 360)`.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::correspondence::Assignment;
use crate::geometry::{midpoint, pixel_distance};

/// Heading in degrees of the vector from `rear` to `front`.
pub fn heading_degrees(front: Point2<i32>, rear: Point2<i32>) -> f32 {
    // Integer offsets: negating a zero `dy` must not yield -0.0.
    let dx = front.x - rear.x;
    let dy = front.y - rear.y;
    let deg = (dx as f32).atan2(-dy as f32).to_degrees();
    let deg = if deg < 0.0 { deg + 360.0 } else { deg };
    // Rounding can land exactly on 360.
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// `(heading_degrees, distance_pixels)` for a pair.
#[inline]
pub fn compute_pose(front: Point2<i32>, rear: Point2<i32>) -> (f32, f32) {
    (heading_degrees(front, rear), pixel_distance(front, rear))
}

/// Per-identity output of one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub identity: String,
    pub front_color: String,
    pub rear_color: String,
    pub front: Option<Point2<i32>>,
    pub rear: Option<Point2<i32>>,
    /// Midpoint between the markers.
    pub center: Option<Point2<f32>>,
    pub heading_degrees: Option<f32>,
    pub distance_pixels: Option<f32>,
    pub resolved: bool,
}

impl Pose {
    /// Build the pose for an assignment. Heading and distance are only
    /// filled for a resolved pair.
    pub fn from_assignment(
        assignment: &Assignment,
        front_color: impl Into<String>,
        rear_color: impl Into<String>,
    ) -> Self {
        let mut pose = Self {
            identity: assignment.identity.clone(),
            front_color: front_color.into(),
            rear_color: rear_color.into(),
            front: assignment.front,
            rear: assignment.rear,
            center: None,
            heading_degrees: None,
            distance_pixels: None,
            resolved: false,
        };
        if let Some((front, rear)) = assignment.pair() {
            let (heading, distance) = compute_pose(front, rear);
            pose.center = Some(midpoint(front, rear));
            pose.heading_degrees = Some(heading);
            pose.distance_pixels = Some(distance);
            pose.resolved = true;
        }
        pose
    }
}
