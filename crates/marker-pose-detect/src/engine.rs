//! Per-frame pipeline: classify, gate by region, score, pair, pose.
//!
//! [`EngineContext`] owns the validated configuration and the calibration
//! lock. It holds no global state; every call to
//! [`EngineContext::process_frame`] runs to completion and returns a fresh
//! [`FrameResult`] with one [`Pose`] per configured identity.

use std::collections::HashMap;

use log::{debug, info, warn};
use marker_pose_core::{BlobObservation, FrameObservations, HsvTolerance};
use serde::{Deserialize, Serialize};

use crate::blob_score::{filter_by_area, score_blob, select_best, select_separated, ScoredBlob};
use crate::calibration::{CalibrationArea, CalibrationLocator, CornerCandidate, DetectionRegion};
use crate::classify::classify;
use crate::correspondence::{resolve_pairs, Assignment, RearCandidates};
use crate::params::{ConfigError, DetectionParams, EngineConfig};
use crate::pose::Pose;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What a palette color is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Front,
    Rear,
    Corner,
}

/// A selected vehicle marker spot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpot {
    pub color: String,
    pub role: MarkerRole,
    pub blob: ScoredBlob,
}

/// Where the observations of one frame went.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub received: usize,
    /// Matched no palette color, or a color no identity uses.
    pub unmatched: usize,
    pub corner_blobs: usize,
    pub out_of_region: usize,
    pub below_min_area: usize,
    /// Zero-perimeter contours.
    pub degenerate: usize,
    pub front_spots: usize,
    pub rear_spots: usize,
    pub resolved: usize,
}

/// Output of one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub region: DetectionRegion,
    /// Every identity, in declaration order.
    pub poses: Vec<Pose>,
    pub markers: Vec<MarkerSpot>,
    pub stats: FrameStats,
}

impl FrameResult {
    pub fn pose(&self, identity: &str) -> Option<&Pose> {
        self.poses.iter().find(|p| p.identity == identity)
    }

    pub fn resolved_poses(&self) -> impl Iterator<Item = &Pose> {
        self.poses.iter().filter(|p| p.resolved)
    }
}

/// Control commands applied between frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Forget the locked calibration area.
    ResetCalibration,
    SetParams(DetectionParams),
    SetTolerance {
        color: String,
        tolerance: HsvTolerance,
    },
}

/// Detection state for one session.
#[derive(Clone, Debug)]
pub struct EngineContext {
    config: EngineConfig,
    roles: HashMap<String, MarkerRole>,
    locator: CalibrationLocator,
}

fn build_roles(config: &EngineConfig) -> HashMap<String, MarkerRole> {
    let mut roles = HashMap::new();
    for id in &config.identities {
        roles.insert(id.front_color.clone(), MarkerRole::Front);
        roles.insert(id.rear_color.clone(), MarkerRole::Rear);
    }
    if let Some(corner) = &config.corner_color {
        roles.insert(corner.clone(), MarkerRole::Corner);
    }
    roles
}

impl EngineContext {
    /// Validate `config` and build a context with no calibration locked.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let roles = build_roles(&config);
        let locator = CalibrationLocator::new(config.params.calibration());
        Ok(Self {
            config,
            roles,
            locator,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn params(&self) -> &DetectionParams {
        &self.config.params
    }

    #[inline]
    pub fn calibration(&self) -> Option<&CalibrationArea> {
        self.locator.locked_area()
    }

    pub fn reset_calibration(&mut self) {
        self.locator.reset();
    }

    /// Replace the detection thresholds. Invalid values leave the current
    /// ones in place.
    pub fn set_params(&mut self, params: DetectionParams) -> Result<(), ConfigError> {
        params.validate()?;
        self.locator.set_params(params.calibration());
        self.config.params = params;
        info!(
            "detection params updated: front>={}, rear>={}, corner>{}, pair<={}",
            params.min_front_area,
            params.min_rear_area,
            params.min_corner_area,
            params.max_pair_distance
        );
        Ok(())
    }

    /// Replace one palette color's tolerances.
    pub fn set_tolerance(&mut self, color: &str, tolerance: HsvTolerance) -> Result<(), ConfigError> {
        self.config.palette = self.config.palette.with_tolerance(color, tolerance)?;
        info!(
            "tolerance for `{color}` set to h={} s={} v={}",
            tolerance.h, tolerance.s, tolerance.v
        );
        Ok(())
    }

    pub fn apply(&mut self, command: EngineCommand) -> Result<(), ConfigError> {
        match command {
            EngineCommand::ResetCalibration => {
                self.reset_calibration();
                Ok(())
            }
            EngineCommand::SetParams(params) => self.set_params(params),
            EngineCommand::SetTolerance { color, tolerance } => self.set_tolerance(&color, tolerance),
        }
    }

    /// Run the full pipeline on one frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(blobs = frame.blobs.len()))
    )]
    pub fn process_frame(&mut self, frame: &FrameObservations) -> FrameResult {
        let params = self.config.params;
        let mut stats = FrameStats {
            received: frame.blobs.len(),
            ..FrameStats::default()
        };

        // Classify and split corners from vehicle markers.
        let mut corners: Vec<CornerCandidate> = Vec::new();
        let mut vehicle: Vec<(&str, MarkerRole, BlobObservation)> = Vec::new();
        for blob in &frame.blobs {
            let role = classify(blob.sample, &self.config.palette)
                .and_then(|m| self.roles.get_key_value(m.name()));
            match role {
                Some((_, MarkerRole::Corner)) => corners.push(CornerCandidate {
                    position: blob.position,
                    area: blob.area,
                }),
                Some((name, &role)) => vehicle.push((name.as_str(), role, *blob)),
                None => stats.unmatched += 1,
            }
        }
        stats.corner_blobs = corners.len();

        let region = match self.config.corner_color {
            Some(_) => self.locator.region(&corners, frame.width, frame.height),
            None => DetectionRegion::full_frame(frame.width, frame.height),
        };

        let mut by_color: HashMap<&str, Vec<BlobObservation>> = HashMap::new();
        for (name, _, blob) in vehicle {
            if region.contains(blob.position) {
                by_color.entry(name).or_default().push(blob);
            } else {
                stats.out_of_region += 1;
            }
        }

        // Per-color scoring and spot selection, in palette order.
        let mut spots: HashMap<&str, Vec<ScoredBlob>> = HashMap::new();
        let mut markers = Vec::new();
        for profile in self.config.palette.iter() {
            let name = profile.name.as_str();
            let role = match self.roles.get(name) {
                Some(&r) if r != MarkerRole::Corner => r,
                _ => continue,
            };
            let Some(blobs) = by_color.remove(name) else {
                continue;
            };

            let min_area = match role {
                MarkerRole::Front => params.min_front_area,
                _ => params.min_rear_area,
            };
            let received = blobs.len();
            let blobs = filter_by_area(blobs, min_area, |b| b.area);
            stats.below_min_area += received - blobs.len();

            let sized = blobs.len();
            let scored: Vec<ScoredBlob> = blobs.iter().filter_map(score_blob).collect();
            stats.degenerate += sized - scored.len();

            let selected = match role {
                MarkerRole::Front => select_separated(scored, &params.front_spots),
                _ => select_best(&scored).into_iter().collect(),
            };
            match role {
                MarkerRole::Front => stats.front_spots += selected.len(),
                _ => stats.rear_spots += selected.len(),
            }
            markers.extend(selected.iter().map(|b| MarkerSpot {
                color: name.to_string(),
                role,
                blob: *b,
            }));
            spots.insert(name, selected);
        }

        let assignments = self.resolve(&spots, params.max_pair_distance);

        let poses: Vec<Pose> = self
            .config
            .identities
            .iter()
            .zip(&assignments)
            .map(|(id, a)| Pose::from_assignment(a, id.front_color.as_str(), id.rear_color.as_str()))
            .collect();
        stats.resolved = poses.iter().filter(|p| p.resolved).count();

        debug!(
            "frame: {} blobs, {} front, {} rear, {}/{} resolved",
            stats.received,
            stats.front_spots,
            stats.rear_spots,
            stats.resolved,
            poses.len()
        );

        FrameResult {
            region,
            poses,
            markers,
            stats,
        }
    }

    /// Pair fronts and rears, one assignment per identity in declaration
    /// order. Identities sharing a front color compete for the same spots.
    fn resolve(&self, spots: &HashMap<&str, Vec<ScoredBlob>>, max_distance: f32) -> Vec<Assignment> {
        let identities = &self.config.identities;
        let mut out: Vec<Option<Assignment>> = vec![None; identities.len()];

        let mut groups: Vec<&str> = Vec::new();
        for id in identities {
            if !groups.contains(&id.front_color.as_str()) {
                groups.push(id.front_color.as_str());
            }
        }

        for front_color in groups {
            let front: Vec<_> = spots
                .get(front_color)
                .map(|v| v.iter().map(|b| b.position).collect())
                .unwrap_or_default();

            let members: Vec<usize> = (0..identities.len())
                .filter(|&i| identities[i].front_color == front_color)
                .collect();

            let expected = members.len().min(self.config.params.front_spots.max_spots);
            if front.len() < expected {
                warn!(
                    "only {} `{front_color}` front markers found, expected {expected}",
                    front.len()
                );
            }

            let rear: Vec<RearCandidates> = members
                .iter()
                .map(|&i| {
                    let id = &identities[i];
                    let positions = spots
                        .get(id.rear_color.as_str())
                        .map(|v| v.iter().map(|b| b.position).collect())
                        .unwrap_or_default();
                    RearCandidates::new(id.name.clone(), positions)
                })
                .collect();

            for (i, a) in members.into_iter().zip(resolve_pairs(&front, &rear, max_distance)) {
                out[i] = Some(a);
            }
        }

        out.into_iter()
            .zip(identities)
            .map(|(a, id)| a.unwrap_or_else(|| Assignment::unresolved(id.name.clone())))
            .collect()
    }
}
