//! Validated, ordered collection of [`ColorProfile`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::{ColorProfile, HsvTolerance, HUE_RANGE};

/// Palette validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("color profile name must not be empty")]
    EmptyName,
    #[error("duplicate color profile `{0}`")]
    DuplicateName(String),
    #[error("color profile `{name}` has hue target {hue}, outside the 0..180 wheel")]
    HueOutOfRange { name: String, hue: u8 },
    #[error("unknown color `{0}`")]
    UnknownColor(String),
}

/// Ordered palette of named colors.
///
/// Declaration order is significant: the classifier breaks distance ties in
/// favor of the earlier profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColorProfile>", into = "Vec<ColorProfile>")]
pub struct Palette {
    profiles: Vec<ColorProfile>,
    index: HashMap<String, usize>,
}

impl Palette {
    /// Validate and build a palette.
    pub fn new(profiles: Vec<ColorProfile>) -> Result<Self, PaletteError> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (idx, profile) in profiles.iter().enumerate() {
            if profile.name.trim().is_empty() {
                return Err(PaletteError::EmptyName);
            }
            if u32::from(profile.target.h) >= HUE_RANGE {
                return Err(PaletteError::HueOutOfRange {
                    name: profile.name.clone(),
                    hue: profile.target.h,
                });
            }
            if index.insert(profile.name.clone(), idx).is_some() {
                return Err(PaletteError::DuplicateName(profile.name.clone()));
            }
        }
        Ok(Self { profiles, index })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColorProfile> {
        self.index.get(name).map(|&idx| &self.profiles[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Profiles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ColorProfile> {
        self.profiles.iter()
    }

    pub fn profiles(&self) -> &[ColorProfile] {
        &self.profiles
    }

    /// Return a copy of this palette with one profile's tolerances replaced.
    pub fn with_tolerance(&self, name: &str, tolerance: HsvTolerance) -> Result<Self, PaletteError> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| PaletteError::UnknownColor(name.to_string()))?;
        let mut profiles = self.profiles.clone();
        profiles[idx].tolerance = tolerance;
        Ok(Self {
            profiles,
            index: self.index.clone(),
        })
    }
}

impl TryFrom<Vec<ColorProfile>> for Palette {
    type Error = PaletteError;

    fn try_from(profiles: Vec<ColorProfile>) -> Result<Self, Self::Error> {
        Palette::new(profiles)
    }
}

impl From<Palette> for Vec<ColorProfile> {
    fn from(palette: Palette) -> Self {
        palette.profiles
    }
}
