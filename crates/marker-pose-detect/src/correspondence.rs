//! Front/rear marker pairing per tracked identity.
//!
//! Greedy nearest-distance matching: identities are visited in the order
//! given, each takes the closest `(front, rear)` pair among its own rear
//! candidates and the fronts not yet claimed. A front position is therefore
//! never shared by two assignments of the same frame. The result is
//! deterministic but not globally optimal; when two identities are equally
//! close to one shared front, the earlier identity keeps it.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::pixel_distance;

/// Rear-marker candidates for one identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RearCandidates {
    pub identity: String,
    pub rear: Vec<Point2<i32>>,
}

impl RearCandidates {
    pub fn new(identity: impl Into<String>, rear: Vec<Point2<i32>>) -> Self {
        Self {
            identity: identity.into(),
            rear,
        }
    }
}

/// Pairing outcome for one identity in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub identity: String,
    pub front: Option<Point2<i32>>,
    pub rear: Option<Point2<i32>>,
    /// `f32::INFINITY` when unresolved.
    pub distance: f32,
    pub resolved: bool,
}

impl Assignment {
    pub fn unresolved(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            front: None,
            rear: None,
            distance: f32::INFINITY,
            resolved: false,
        }
    }

    /// `(front, rear)` when resolved.
    #[inline]
    pub fn pair(&self) -> Option<(Point2<i32>, Point2<i32>)> {
        match (self.resolved, self.front, self.rear) {
            (true, Some(f), Some(r)) => Some((f, r)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PairOption {
    front_index: usize,
    rear: Point2<i32>,
    distance: f32,
}

fn closest_pair(front: &[Point2<i32>], used_front: &[bool], rear: &[Point2<i32>]) -> Option<PairOption> {
    let mut best: Option<PairOption> = None;
    for &r in rear {
        for (fi, &f) in front.iter().enumerate() {
            if used_front[fi] {
                continue;
            }
            let distance = pixel_distance(f, r);
            if best.map(|b| distance < b.distance).unwrap_or(true) {
                best = Some(PairOption {
                    front_index: fi,
                    rear: r,
                    distance,
                });
            }
        }
    }
    best
}

/// Resolve one assignment per entry of `rear`, in the same order.
///
/// A pair is accepted when its distance is at most `max_distance`.
pub fn resolve_pairs(front: &[Point2<i32>], rear: &[RearCandidates], max_distance: f32) -> Vec<Assignment> {
    let mut used_front = vec![false; front.len()];
    let mut out = Vec::with_capacity(rear.len());

    for cands in rear {
        let mut assignment = Assignment::unresolved(cands.identity.clone());
        if let Some(best) = closest_pair(front, &used_front, &cands.rear) {
            if best.distance <= max_distance {
                used_front[best.front_index] = true;
                assignment.front = Some(front[best.front_index]);
                assignment.rear = Some(best.rear);
                assignment.distance = best.distance;
                assignment.resolved = true;
            }
        }
        out.push(assignment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: i32, y: i32) -> Point2<i32> {
        Point2::new(x, y)
    }

    #[test]
    fn two_vehicles_pick_their_own_fronts() {
        let front = [p(100, 100), p(300, 100)];
        let rear = vec![
            RearCandidates::new("Vehicle-Blue", vec![p(100, 150)]),
            RearCandidates::new("Vehicle-Green", vec![p(300, 150)]),
        ];
        let out = resolve_pairs(&front, &rear, 200.0);

        assert_eq!(out[0].pair(), Some((p(100, 100), p(100, 150))));
        assert_relative_eq!(out[0].distance, 50.0);
        assert_eq!(out[1].pair(), Some((p(300, 100), p(300, 150))));
        assert_relative_eq!(out[1].distance, 50.0);
    }

    #[test]
    fn shared_front_goes_to_first_identity() {
        let front = [p(0, 0)];
        let rear = vec![
            RearCandidates::new("A", vec![p(50, 0)]),
            RearCandidates::new("B", vec![p(0, 50)]),
        ];
        let out = resolve_pairs(&front, &rear, 200.0);
        assert!(out[0].resolved);
        assert_eq!(out[0].front, Some(p(0, 0)));
        assert!(!out[1].resolved);
        assert_eq!(out[1].front, None);
        assert!(out[1].distance.is_infinite());
    }

    #[test]
    fn cutoff_is_inclusive() {
        let front = [p(0, 0)];
        let at = vec![RearCandidates::new("A", vec![p(0, 200)])];
        assert!(resolve_pairs(&front, &at, 200.0)[0].resolved);

        let beyond = vec![RearCandidates::new("A", vec![p(0, 201)])];
        let out = resolve_pairs(&front, &beyond, 200.0);
        assert!(!out[0].resolved);
        assert_eq!(out[0].rear, None);
    }

    #[test]
    fn considers_every_rear_candidate() {
        let front = [p(0, 0), p(500, 0)];
        let rear = vec![RearCandidates::new("A", vec![p(0, 180), p(520, 0)])];
        let out = resolve_pairs(&front, &rear, 200.0);
        assert_eq!(out[0].pair(), Some((p(500, 0), p(520, 0))));
    }

    #[test]
    fn fronts_are_never_shared() {
        let front = [p(100, 100), p(130, 100), p(400, 400)];
        let rear = vec![
            RearCandidates::new("A", vec![p(110, 120)]),
            RearCandidates::new("B", vec![p(112, 118)]),
            RearCandidates::new("C", vec![p(115, 119)]),
            RearCandidates::new("D", vec![]),
        ];
        let out = resolve_pairs(&front, &rear, 500.0);
        let fronts: Vec<_> = out.iter().filter_map(|a| a.front).collect();
        for (i, a) in fronts.iter().enumerate() {
            assert!(!fronts[i + 1..].contains(a), "front {a:?} reused");
        }
        assert_eq!(out.len(), 4);
        assert!(!out[3].resolved);
    }

    #[test]
    fn resolution_is_deterministic() {
        let front = [p(10, 10), p(60, 10), p(35, 60)];
        let rear = vec![
            RearCandidates::new("A", vec![p(35, 35)]),
            RearCandidates::new("B", vec![p(35, 36)]),
        ];
        let a = resolve_pairs(&front, &rear, 200.0);
        let b = resolve_pairs(&front, &rear, 200.0);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_front_leaves_everyone_unresolved() {
        let rear = vec![RearCandidates::new("A", vec![p(1, 1)])];
        let out = resolve_pairs(&[], &rear, 200.0);
        assert_eq!(out, vec![Assignment::unresolved("A")]);
    }
}
