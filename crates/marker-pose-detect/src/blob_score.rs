//! Shape/size scoring of blob candidates and per-color spot selection.

use marker_pose_core::BlobObservation;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::pixel_distance;

/// Spot selection for colors that may appear several times per frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotSelectionParams {
    /// Candidates closer than this to an already accepted spot are rejected.
    pub min_separation_px: f32,
    /// Upper bound on accepted spots per color.
    pub max_spots: usize,
}

impl Default for SpotSelectionParams {
    fn default() -> Self {
        Self {
            min_separation_px: 30.0,
            max_spots: 4,
        }
    }
}

/// A blob that survived the degenerate-contour check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredBlob {
    pub position: Point2<i32>,
    pub area: f32,
    pub perimeter: f32,
    /// Isoperimetric ratio `4πA / P²`, 1.0 for a disc.
    pub compactness: f32,
    /// `area * (1 + compactness)`.
    pub density_score: f32,
}

/// Isoperimetric compactness, `None` for a degenerate (zero-perimeter) contour.
#[inline]
pub fn compactness(area: f32, perimeter: f32) -> Option<f32> {
    if perimeter <= 0.0 || !perimeter.is_finite() || !area.is_finite() {
        return None;
    }
    Some(4.0 * std::f32::consts::PI * area / (perimeter * perimeter))
}

/// Density score rewarding both size and roundness.
#[inline]
pub fn density_score(area: f32, perimeter: f32) -> Option<f32> {
    compactness(area, perimeter).map(|c| area * (1.0 + c))
}

/// Score one observation; degenerate contours are dropped.
pub fn score_blob(obs: &BlobObservation) -> Option<ScoredBlob> {
    let compactness = compactness(obs.area, obs.perimeter)?;
    Some(ScoredBlob {
        position: obs.position,
        area: obs.area,
        perimeter: obs.perimeter,
        compactness,
        density_score: obs.area * (1.0 + compactness),
    })
}

/// Keep blobs whose area is at least `min_area`.
pub fn filter_by_area<T, F>(blobs: Vec<T>, min_area: f32, area: F) -> Vec<T>
where
    F: Fn(&T) -> f32,
{
    blobs.into_iter().filter(|b| area(b) >= min_area).collect()
}

fn sort_by_score_desc(v: &mut [ScoredBlob]) {
    v.sort_by(|a, b| {
        b.density_score
            .partial_cmp(&a.density_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Accept candidates in descending score order, skipping any that fall within
/// `min_separation_px` of an accepted one, up to `max_spots`.
///
/// The sort is stable, so equal scores keep input order.
pub fn select_separated(mut candidates: Vec<ScoredBlob>, params: &SpotSelectionParams) -> Vec<ScoredBlob> {
    sort_by_score_desc(&mut candidates);

    let mut accepted: Vec<ScoredBlob> = Vec::with_capacity(params.max_spots.min(candidates.len()));
    for cand in candidates {
        if accepted.len() >= params.max_spots {
            break;
        }
        let too_close = accepted
            .iter()
            .any(|a| pixel_distance(a.position, cand.position) < params.min_separation_px);
        if !too_close {
            accepted.push(cand);
        }
    }
    accepted
}

/// Highest-scoring candidate; ties keep the earliest.
pub fn select_best(candidates: &[ScoredBlob]) -> Option<ScoredBlob> {
    candidates.iter().copied().fold(None, |best, c| match best {
        Some(b) if b.density_score >= c.density_score => Some(b),
        _ => Some(c),
    })
}
