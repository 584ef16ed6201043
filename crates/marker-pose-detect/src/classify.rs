//! Palette lookup for HSV samples.
//!
//! Distance metric: `dh + ds + dv`, unweighted, where `dh` is the circular
//! hue distance on the 180-unit wheel. A profile is a candidate only when every
//! channel is within its own tolerance; among candidates the smallest
//! distance wins and ties go to the profile declared first.

use marker_pose_core::{hue_distance, ColorProfile, Hsv, Palette};

/// Per-channel absolute differences between a sample and a profile target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDistance {
    pub dh: u32,
    pub ds: u32,
    pub dv: u32,
}

impl ChannelDistance {
    pub fn between(sample: Hsv, target: Hsv) -> Self {
        Self {
            dh: hue_distance(sample.h, target.h),
            ds: u32::from(sample.s.abs_diff(target.s)),
            dv: u32::from(sample.v.abs_diff(target.v)),
        }
    }

    /// Combined scalar distance.
    #[inline]
    pub fn total(&self) -> u32 {
        self.dh + self.ds + self.dv
    }

    /// Whether every channel lies inside the profile's tolerance window.
    #[inline]
    pub fn within(&self, profile: &ColorProfile) -> bool {
        self.dh <= u32::from(profile.tolerance.h)
            && self.ds <= u32::from(profile.tolerance.s)
            && self.dv <= u32::from(profile.tolerance.v)
    }
}

/// Best palette match for a sample. Borrows the profile from the palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorMatch<'a> {
    pub profile: &'a ColorProfile,
    pub distance: u32,
}

impl<'a> ColorMatch<'a> {
    #[inline]
    pub fn name(&self) -> &'a str {
        &self.profile.name
    }
}

/// Find the best-matching profile for `sample`, or `None` when no profile's
/// tolerance gate passes.
pub fn classify(sample: Hsv, palette: &Palette) -> Option<ColorMatch<'_>> {
    let mut best: Option<ColorMatch<'_>> = None;
    for profile in palette.iter() {
        let d = ChannelDistance::between(sample, profile.target);
        if !d.within(profile) {
            continue;
        }
        let distance = d.total();
        if best.map(|b| distance < b.distance).unwrap_or(true) {
            best = Some(ColorMatch { profile, distance });
        }
    }
    best
}

/// Classifier bound to one palette.
#[derive(Clone, Copy, Debug)]
pub struct ColorClassifier<'a> {
    palette: &'a Palette,
}

impl<'a> ColorClassifier<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self { palette }
    }

    #[inline]
    pub fn palette(&self) -> &'a Palette {
        self.palette
    }

    #[inline]
    pub fn classify(&self, sample: Hsv) -> Option<ColorMatch<'a>> {
        classify(sample, self.palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_pose_core::HsvTolerance;

    fn palette(profiles: &[(&str, Hsv, HsvTolerance)]) -> Palette {
        Palette::new(
            profiles
                .iter()
                .map(|(n, t, tol)| ColorProfile::new(*n, *t, *tol))
                .collect(),
        )
        .expect("palette")
    }

    #[test]
    fn hue_wraps_around_wheel_boundary() {
        let p = palette(&[("Red", Hsv::new(2, 200, 200), HsvTolerance::new(5, 10, 10))]);
        let m = classify(Hsv::new(178, 200, 200), &p).expect("match across the wrap");
        assert_eq!(m.name(), "Red");
        assert_eq!(m.distance, 4);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let target = Hsv::new(100, 150, 120);
        let tol = HsvTolerance::new(8, 20, 30);
        let p = palette(&[("Blue", target, tol)]);

        for sample in [Hsv::new(108, 170, 150), Hsv::new(92, 130, 90)] {
            let m = classify(sample, &p).expect("exactly at tolerance");
            assert_eq!(m.distance, 8 + 20 + 30);
        }

        for sample in [
            Hsv::new(109, 150, 120),
            Hsv::new(100, 171, 120),
            Hsv::new(100, 150, 89),
        ] {
            assert!(classify(sample, &p).is_none(), "{sample:?} must be rejected");
        }
    }

    #[test]
    fn smallest_distance_wins() {
        let tol = HsvTolerance::new(30, 255, 255);
        let p = palette(&[
            ("Yellow", Hsv::new(25, 200, 200), tol),
            ("Orange", Hsv::new(12, 200, 200), tol),
        ]);
        let m = classify(Hsv::new(14, 200, 200), &p).expect("match");
        assert_eq!(m.name(), "Orange");
        assert_eq!(m.distance, 2);
    }

    #[test]
    fn ties_go_to_first_declared_profile() {
        let tol = HsvTolerance::new(10, 255, 255);
        let p = palette(&[
            ("Low", Hsv::new(40, 200, 200), tol),
            ("High", Hsv::new(50, 200, 200), tol),
        ]);
        let m = classify(Hsv::new(45, 200, 200), &p).expect("match");
        assert_eq!(m.name(), "Low");
    }

    #[test]
    fn gate_rejects_close_total_distance_with_one_channel_out() {
        // Total distance is tiny but saturation tolerance is zero.
        let p = palette(&[("Green", Hsv::new(72, 255, 60), HsvTolerance::new(9, 0, 255))]);
        assert!(classify(Hsv::new(72, 254, 60), &p).is_none());
        assert!(classify(Hsv::new(70, 255, 200), &p).is_some());
    }

    #[test]
    fn classifier_returns_borrowed_profile() {
        let p = palette(&[("Front", Hsv::new(114, 255, 150), HsvTolerance::new(34, 48, 255))]);
        let classifier = ColorClassifier::new(&p);
        let m = classifier.classify(Hsv::new(110, 240, 100)).expect("match");
        assert!(std::ptr::eq(m.profile, p.get("Front").expect("profile")));
    }
}
