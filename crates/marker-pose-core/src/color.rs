use serde::{Deserialize, Serialize};

/// Modulus of the hue wheel (OpenCV-style 8-bit hue, 0..180).
pub const HUE_RANGE: u32 = 180;

/// One HSV sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Per-channel acceptance window around a profile target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvTolerance {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl HsvTolerance {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// A named color the classifier can recognise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub name: String,
    pub target: Hsv,
    pub tolerance: HsvTolerance,
}

impl ColorProfile {
    pub fn new(name: impl Into<String>, target: Hsv, tolerance: HsvTolerance) -> Self {
        Self {
            name: name.into(),
            target,
            tolerance,
        }
    }
}

/// Shortest distance between two hues on the wheel.
///
/// Inputs above the wheel are wrapped first, so `hue_distance(2, 178) == 4`.
#[inline]
pub fn hue_distance(a: u8, b: u8) -> u32 {
    let diff = (i32::from(a) - i32::from(b)).unsigned_abs() % HUE_RANGE;
    diff.min(HUE_RANGE - diff)
}
