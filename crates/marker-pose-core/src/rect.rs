use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle with inclusive bounds.
///
/// Invariant: `x_min <= x_max` and `y_min <= y_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl PixelRect {
    /// Smallest rectangle containing every point, `None` for an empty slice.
    pub fn bounding(points: &[Point2<i32>]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        Some(points.iter().skip(1).fold(init, |r, p| Self {
            x_min: r.x_min.min(p.x),
            y_min: r.y_min.min(p.y),
            x_max: r.x_max.max(p.x),
            y_max: r.y_max.max(p.y),
        }))
    }

    /// Rectangle covering a whole `width x height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let clamp = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        Self {
            x_min: 0,
            y_min: 0,
            x_max: (clamp(width) - 1).max(0),
            y_max: (clamp(height) - 1).max(0),
        }
    }

    /// Inclusive point-in-rectangle test.
    #[inline]
    pub fn contains(&self, p: Point2<i32>) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// `x_max - x_min`, the width of the image slice between the bounds.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.x_max - self.x_min).unsigned_abs()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        (self.y_max - self.y_min).unsigned_abs()
    }

    pub fn origin(&self) -> Point2<i32> {
        Point2::new(self.x_min, self.y_min)
    }
}
