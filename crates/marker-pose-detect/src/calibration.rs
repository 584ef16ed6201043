//! Detection-region calibration from four corner markers.
//!
//! The first successful detection is locked and returned unchanged on every
//! later call until [`CalibrationLocator::reset`] is issued. Corner flicker or
//! partial occlusion therefore cannot move an established region.

use log::{info, warn};
use marker_pose_core::PixelRect;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Number of corner markers spanning the area.
pub const REQUIRED_CORNERS: usize = 4;

/// A corner-marker candidate: centroid and contour area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerCandidate {
    pub position: Point2<i32>,
    pub area: f32,
}

/// Rectangular detection area bounded by four corner markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationArea {
    /// Ordered top-left, top-right, bottom-left, bottom-right.
    pub corners: [Point2<i32>; 4],
    pub bounds: PixelRect,
    pub locked: bool,
}

impl CalibrationArea {
    /// Build an unlocked area from four unordered corner positions.
    pub fn from_corners(points: [Point2<i32>; 4]) -> Self {
        let corners = order_corners(points);
        let mut bounds = PixelRect {
            x_min: corners[0].x,
            y_min: corners[0].y,
            x_max: corners[0].x,
            y_max: corners[0].y,
        };
        for p in &corners[1..] {
            bounds.x_min = bounds.x_min.min(p.x);
            bounds.y_min = bounds.y_min.min(p.y);
            bounds.x_max = bounds.x_max.max(p.x);
            bounds.y_max = bounds.y_max.max(p.y);
        }
        Self {
            corners,
            bounds,
            locked: false,
        }
    }

    #[inline]
    pub fn contains(&self, p: Point2<i32>) -> bool {
        self.bounds.contains(p)
    }
}

/// Sort four points into TL, TR, BL, BR: split on `y` into a top and bottom
/// pair, then order each pair on `x`.
pub fn order_corners(mut points: [Point2<i32>; 4]) -> [Point2<i32>; 4] {
    points.sort_by_key(|p| (p.y, p.x));
    let (top, bottom) = points.split_at_mut(2);
    top.sort_by_key(|p| p.x);
    bottom.sort_by_key(|p| p.x);
    points
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("found {found} corner markers, need {required}")]
    InsufficientCorners { found: usize, required: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Corner markers must be strictly larger than this (pixels²).
    pub min_corner_area: f32,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            min_corner_area: 7.0,
        }
    }
}

/// Region the rest of the pipeline searches in for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRegion {
    pub bounds: PixelRect,
    /// `None` when falling back to the full frame.
    pub calibration: Option<CalibrationArea>,
    /// Pixel size of the cropped image: `max - min` of a calibration area,
    /// the frame size otherwise.
    pub width: u32,
    pub height: u32,
}

impl DetectionRegion {
    /// The whole `width x height` frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            bounds: PixelRect::full_frame(width, height),
            calibration: None,
            width,
            height,
        }
    }

    pub fn calibrated(area: CalibrationArea) -> Self {
        Self {
            bounds: area.bounds,
            calibration: Some(area),
            width: area.bounds.width(),
            height: area.bounds.height(),
        }
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    #[inline]
    pub fn contains(&self, p: Point2<i32>) -> bool {
        self.bounds.contains(p)
    }
}

/// Lock-once calibration area state.
#[derive(Clone, Debug, Default)]
pub struct CalibrationLocator {
    params: CalibrationParams,
    locked: Option<CalibrationArea>,
}

impl CalibrationLocator {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            locked: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Replace the corner-area threshold; a locked area stays locked.
    pub fn set_params(&mut self, params: CalibrationParams) {
        self.params = params;
    }

    #[inline]
    pub fn locked_area(&self) -> Option<&CalibrationArea> {
        self.locked.as_ref()
    }

    /// Return the locked area, or try to lock one from `candidates`.
    ///
    /// Uses the four largest candidates above the area threshold.
    pub fn locate(&mut self, candidates: &[CornerCandidate]) -> Result<CalibrationArea, CalibrationError> {
        if let Some(area) = self.locked {
            return Ok(area);
        }

        let mut usable: Vec<CornerCandidate> = candidates
            .iter()
            .copied()
            .filter(|c| c.area > self.params.min_corner_area)
            .collect();

        if usable.len() < REQUIRED_CORNERS {
            return Err(CalibrationError::InsufficientCorners {
                found: usable.len(),
                required: REQUIRED_CORNERS,
            });
        }

        usable.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(std::cmp::Ordering::Equal));
        let points = [
            usable[0].position,
            usable[1].position,
            usable[2].position,
            usable[3].position,
        ];

        let mut area = CalibrationArea::from_corners(points);
        area.locked = true;
        info!(
            "calibration area locked: x {}..={}, y {}..={}",
            area.bounds.x_min, area.bounds.x_max, area.bounds.y_min, area.bounds.y_max
        );
        self.locked = Some(area);
        Ok(area)
    }

    /// Region for this frame: the calibration area, or the whole
    /// `width x height` frame if none can be established.
    pub fn region(&mut self, candidates: &[CornerCandidate], width: u32, height: u32) -> DetectionRegion {
        match self.locate(candidates) {
            Ok(area) => DetectionRegion::calibrated(area),
            Err(err) => {
                warn!("{err}; using the full frame");
                DetectionRegion::full_frame(width, height)
            }
        }
    }

    /// Drop the locked area so the next call re-detects it.
    pub fn reset(&mut self) {
        if self.locked.take().is_some() {
            info!("calibration area reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(x: i32, y: i32, area: f32) -> CornerCandidate {
        CornerCandidate {
            position: Point2::new(x, y),
            area,
        }
    }

    fn square(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<CornerCandidate> {
        vec![
            corner(x1, y1, 40.0),
            corner(x0, y0, 40.0),
            corner(x0, y1, 40.0),
            corner(x1, y0, 40.0),
        ]
    }

    #[test]
    fn orders_corners_tl_tr_bl_br() {
        let ordered = order_corners([
            Point2::new(600, 460),
            Point2::new(42, 12),
            Point2::new(38, 455),
            Point2::new(598, 8),
        ]);
        assert_eq!(
            ordered,
            [
                Point2::new(42, 12),
                Point2::new(598, 8),
                Point2::new(38, 455),
                Point2::new(600, 460),
            ]
        );
    }

    #[test]
    fn insufficient_corners_is_reported() {
        let mut loc = CalibrationLocator::default();
        let cands = vec![corner(0, 0, 40.0), corner(10, 0, 40.0), corner(0, 10, 3.0)];
        assert_eq!(
            loc.locate(&cands),
            Err(CalibrationError::InsufficientCorners {
                found: 2,
                required: 4
            })
        );
        assert!(loc.locked_area().is_none());
    }

    #[test]
    fn corner_area_threshold_is_strict() {
        let mut loc = CalibrationLocator::new(CalibrationParams {
            min_corner_area: 40.0,
        });
        assert!(loc.locate(&square(0, 0, 100, 100)).is_err());
    }

    #[test]
    fn uses_four_largest_candidates() {
        let mut loc = CalibrationLocator::default();
        let mut cands = square(50, 40, 590, 440);
        cands.push(corner(300, 200, 12.0)); // small blob inside, ignored
        let area = loc.locate(&cands).expect("area");
        assert_eq!(
            area.bounds,
            PixelRect {
                x_min: 50,
                y_min: 40,
                x_max: 590,
                y_max: 440
            }
        );
        assert!(area.locked);
    }

    #[test]
    fn locked_area_survives_new_corners_until_reset() {
        let mut loc = CalibrationLocator::default();
        let first = loc.locate(&square(50, 40, 590, 440)).expect("first");

        let second = loc.locate(&square(10, 10, 300, 300)).expect("second");
        assert_eq!(second, first);

        // Losing every corner does not unlock either.
        assert_eq!(loc.locate(&[]).expect("still locked"), first);

        loc.reset();
        let third = loc.locate(&square(10, 10, 300, 300)).expect("third");
        assert_eq!(third.bounds.x_max, 300);
        assert_ne!(third, first);
    }

    #[test]
    fn region_falls_back_to_full_frame() {
        let mut loc = CalibrationLocator::default();
        let region = loc.region(&[], 640, 480);
        assert!(!region.is_calibrated());
        assert_eq!(region.bounds, PixelRect::full_frame(640, 480));
        assert_eq!((region.width, region.height), (640, 480));
        assert!(region.contains(Point2::new(639, 479)));
    }

    #[test]
    fn calibrated_region_spans_corner_centroids() {
        let mut loc = CalibrationLocator::default();
        let region = loc.region(&square(50, 40, 590, 440), 640, 480);
        assert!(region.is_calibrated());
        assert_eq!((region.width, region.height), (540, 400));
    }
}
