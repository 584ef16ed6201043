//! Engine configuration: palette, tracked identities and detection parameters.

use std::collections::HashSet;

use marker_pose_core::{ColorProfile, Hsv, HsvTolerance, Palette, PaletteError};
use serde::{Deserialize, Serialize};

use crate::blob_score::SpotSelectionParams;
use crate::calibration::CalibrationParams;

/// Runtime-adjustable detection thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Front-marker blobs with a smaller area are discarded (pixels²).
    pub min_front_area: f32,
    /// Rear-marker blobs with a smaller area are discarded (pixels²).
    pub min_rear_area: f32,
    /// Corner-marker blobs must be strictly larger than this (pixels²).
    pub min_corner_area: f32,
    pub front_spots: SpotSelectionParams,
    /// Largest accepted front/rear separation (pixels, inclusive).
    pub max_pair_distance: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_front_area: 100.0,
            min_rear_area: 80.0,
            min_corner_area: CalibrationParams::default().min_corner_area,
            front_spots: SpotSelectionParams::default(),
            max_pair_distance: 200.0,
        }
    }
}

impl DetectionParams {
    pub fn calibration(&self) -> CalibrationParams {
        CalibrationParams {
            min_corner_area: self.min_corner_area,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("min_front_area", self.min_front_area),
            ("min_rear_area", self.min_rear_area),
            ("min_corner_area", self.min_corner_area),
            ("front_spots.min_separation_px", self.front_spots.min_separation_px),
            ("max_pair_distance", self.max_pair_distance),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if self.front_spots.max_spots == 0 {
            return Err(ConfigError::ZeroFrontSpots);
        }
        Ok(())
    }
}

/// A configured tracked object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIdentity {
    pub name: String,
    /// May be shared by several identities.
    pub front_color: String,
    /// Unique per identity.
    pub rear_color: String,
}

impl TrackedIdentity {
    pub fn new(
        name: impl Into<String>,
        front_color: impl Into<String>,
        rear_color: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            front_color: front_color.into(),
            rear_color: rear_color.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("no tracked identities configured")]
    NoIdentities,
    #[error("identity name must not be empty")]
    EmptyIdentityName,
    #[error("duplicate identity `{0}`")]
    DuplicateIdentity(String),
    #[error("identity `{identity}` references unknown color `{color}`")]
    UnknownColor { identity: String, color: String },
    #[error("rear color `{color}` is used by both `{first}` and `{second}`")]
    RearColorReused {
        color: String,
        first: String,
        second: String,
    },
    #[error("color `{0}` is used both as a front and as a rear color")]
    RearColorIsFront(String),
    #[error("corner color `{0}` is not in the palette")]
    UnknownCornerColor(String),
    #[error("corner color `{0}` is also a vehicle marker color")]
    CornerColorOverlaps(String),
    #[error("parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    #[error("front_spots.max_spots must be at least 1")]
    ZeroFrontSpots,
}

/// Everything needed to build an [`EngineContext`](crate::EngineContext).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub palette: Palette,
    pub identities: Vec<TrackedIdentity>,
    /// Color of the four calibration corner markers. Without it the full
    /// frame is always used.
    #[serde(default)]
    pub corner_color: Option<String>,
    #[serde(default)]
    pub params: DetectionParams,
}

impl EngineConfig {
    /// Check identity/palette consistency and parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        if self.identities.is_empty() {
            return Err(ConfigError::NoIdentities);
        }

        let mut names = HashSet::new();
        let mut fronts = HashSet::new();
        let mut rear_owner: Vec<(&str, &str)> = Vec::new();

        for id in &self.identities {
            if id.name.trim().is_empty() {
                return Err(ConfigError::EmptyIdentityName);
            }
            if !names.insert(id.name.as_str()) {
                return Err(ConfigError::DuplicateIdentity(id.name.clone()));
            }
            for color in [&id.front_color, &id.rear_color] {
                if !self.palette.contains(color) {
                    return Err(ConfigError::UnknownColor {
                        identity: id.name.clone(),
                        color: color.clone(),
                    });
                }
            }
            if let Some((_, first)) = rear_owner.iter().find(|(c, _)| *c == id.rear_color) {
                return Err(ConfigError::RearColorReused {
                    color: id.rear_color.clone(),
                    first: (*first).to_string(),
                    second: id.name.clone(),
                });
            }
            rear_owner.push((id.rear_color.as_str(), id.name.as_str()));
            fronts.insert(id.front_color.as_str());
        }

        if let Some((rear, _)) = rear_owner.iter().find(|(c, _)| fronts.contains(c)) {
            return Err(ConfigError::RearColorIsFront((*rear).to_string()));
        }

        if let Some(corner) = &self.corner_color {
            if !self.palette.contains(corner) {
                return Err(ConfigError::UnknownCornerColor(corner.clone()));
            }
            if fronts.contains(corner.as_str()) || rear_owner.iter().any(|(c, _)| *c == corner.as_str()) {
                return Err(ConfigError::CornerColorOverlaps(corner.clone()));
            }
        }
        Ok(())
    }

    /// Four vehicles sharing one front color, each with its own rear color,
    /// framed by red corner markers.
    pub fn vehicle_fleet_default() -> Result<Self, ConfigError> {
        let profiles = vec![
            ColorProfile::new("Front", Hsv::new(114, 255, 150), HsvTolerance::new(34, 48, 255)),
            ColorProfile::new("Rear1", Hsv::new(72, 255, 60), HsvTolerance::new(9, 0, 255)),
            ColorProfile::new("Rear2", Hsv::new(178, 190, 210), HsvTolerance::new(8, 103, 237)),
            ColorProfile::new("Rear3", Hsv::new(155, 150, 110), HsvTolerance::new(27, 103, 41)),
            ColorProfile::new("Rear4", Hsv::new(11, 160, 255), HsvTolerance::new(6, 117, 46)),
            ColorProfile::new("Corner", Hsv::new(0, 188, 163), HsvTolerance::new(10, 68, 93)),
        ];
        let palette = Palette::new(profiles)?;

        let identities = (1..=4)
            .map(|i| TrackedIdentity::new(format!("Vehicle-{i}"), "Front", format!("Rear{i}")))
            .collect();

        let config = Self {
            palette,
            identities,
            corner_color: Some("Corner".to_string()),
            params: DetectionParams::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> HsvTolerance {
        HsvTolerance::new(10, 60, 60)
    }

    fn config() -> EngineConfig {
        let palette = Palette::new(vec![
            ColorProfile::new("Orange", Hsv::new(12, 200, 200), tol()),
            ColorProfile::new("Blue", Hsv::new(110, 200, 200), tol()),
            ColorProfile::new("Green", Hsv::new(60, 200, 200), tol()),
            ColorProfile::new("Red", Hsv::new(0, 200, 200), tol()),
        ])
        .expect("palette");
        EngineConfig {
            palette,
            identities: vec![
                TrackedIdentity::new("Vehicle-Blue", "Orange", "Blue"),
                TrackedIdentity::new("Vehicle-Green", "Orange", "Green"),
            ],
            corner_color: Some("Red".into()),
            params: DetectionParams::default(),
        }
    }

    #[test]
    fn default_fleet_is_valid() {
        let cfg = EngineConfig::vehicle_fleet_default().expect("fleet");
        assert_eq!(cfg.palette.len(), 6);
        assert_eq!(cfg.identities.len(), 4);
        assert_eq!(cfg.corner_color.as_deref(), Some("Corner"));
        let rears: Vec<_> = cfg.identities.iter().map(|id| id.rear_color.as_str()).collect();
        assert_eq!(rears, ["Rear1", "Rear2", "Rear3", "Rear4"]);
        assert!(cfg.identities.iter().all(|id| id.front_color == "Front"));
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let p = DetectionParams::default();
        assert_eq!(p.min_front_area, 100.0);
        assert_eq!(p.min_rear_area, 80.0);
        assert_eq!(p.min_corner_area, 7.0);
        assert_eq!(p.front_spots.max_spots, 4);
        assert_eq!(p.front_spots.min_separation_px, 30.0);
        assert_eq!(p.max_pair_distance, 200.0);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut cfg = config();
        cfg.identities[1].name = "Vehicle-Blue".into();
        cfg.identities[1].rear_color = "Green".into();
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateIdentity("Vehicle-Blue".into()))
        );
    }

    #[test]
    fn shared_rear_color_is_rejected() {
        let mut cfg = config();
        cfg.identities[1].rear_color = "Blue".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RearColorReused { .. })
        ));
    }

    #[test]
    fn unknown_colors_are_rejected() {
        let mut cfg = config();
        cfg.identities[0].front_color = "Pink".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::UnknownColor { .. })));

        let mut cfg = config();
        cfg.corner_color = Some("Pink".into());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UnknownCornerColor("Pink".into()))
        );
    }

    #[test]
    fn rear_used_as_front_is_rejected() {
        let mut cfg = config();
        cfg.identities[1].front_color = "Blue".into();
        assert_eq!(cfg.validate(), Err(ConfigError::RearColorIsFront("Blue".into())));
    }

    #[test]
    fn corner_color_must_be_distinct() {
        let mut cfg = config();
        cfg.corner_color = Some("Orange".into());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CornerColorOverlaps("Orange".into()))
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut cfg = config();
        cfg.params.max_pair_distance = f32::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter {
                name: "max_pair_distance",
                ..
            })
        ));

        let mut cfg = config();
        cfg.params.front_spots.max_spots = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFrontSpots));
    }

    #[test]
    fn params_fill_missing_fields_from_defaults() {
        let p: DetectionParams = serde_json::from_str(r#"{"max_pair_distance": 150.0}"#).expect("json");
        assert_eq!(p.max_pair_distance, 150.0);
        assert_eq!(p.min_front_area, 100.0);
    }
}
