// SPDX-License-Identifier: MIT OR Apache-2.0
//! Key lookup policies and easing curves.
//!
//! Two policies resolve a value from an ordered key set:
//! - **Hold**: the value of the greatest key at or before the query.
//! - **Continuous**: eased linear interpolation between the bracketing pair,
//!   clamped to the first/last value outside the key range.

use crate::error::{TimelineError, TimelineResult};
use serde::{Deserialize, Serialize};

/// Easing curve applied to the local interpolation factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Easing {
    /// No easing
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseInQuad,
    /// Quadratic deceleration
    EaseOutQuad,
    /// Quadratic acceleration then deceleration
    EaseInOutQuad,
    /// Cubic acceleration
    EaseInCubic,
    /// Cubic deceleration
    EaseOutCubic,
    /// Cubic acceleration then deceleration
    EaseInOutCubic,
}

impl Easing {
    /// Map `t` in [0, 1] through the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseInQuad => "Ease In (Quad)",
            Easing::EaseOutQuad => "Ease Out (Quad)",
            Easing::EaseInOutQuad => "Ease In/Out (Quad)",
            Easing::EaseInCubic => "Ease In (Cubic)",
            Easing::EaseOutCubic => "Ease Out (Cubic)",
            Easing::EaseInOutCubic => "Ease In/Out (Cubic)",
        }
    }

    /// All easing curves
    pub fn all() -> &'static [Easing] {
        &[
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
        ]
    }
}

/// Values that can be linearly interpolated component-wise
pub trait Lerp: Copy {
    /// Interpolate from `self` toward `other` by `t`
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for [f32; 2] {
    fn lerp(self, other: Self, t: f32) -> Self {
        [self[0].lerp(other[0], t), self[1].lerp(other[1], t)]
    }
}

/// Hold lookup over keys sorted ascending.
///
/// Returns `None` when `q` precedes every key.
pub fn hold<K: PartialOrd + Copy, V>(keys: &[(K, V)], q: K) -> Option<&V> {
    hold_by(keys, q, |(k, _)| *k).map(|(_, v)| v)
}

/// Hold lookup over items sorted ascending by `key`
pub fn hold_by<T, K: PartialOrd>(items: &[T], q: K, key: impl Fn(&T) -> K) -> Option<&T> {
    let idx = items.partition_point(|item| key(item) <= q);
    idx.checked_sub(1).map(|i| &items[i])
}

/// Continuous lookup over keys sorted ascending.
///
/// `easing_for_segment(i)` supplies the curve used between key `i` and `i + 1`.
/// An empty key set is an invariant violation.
pub fn continuous<V: Lerp>(
    keys: &[(f32, V)],
    q: f32,
    easing_for_segment: impl Fn(usize) -> Easing,
) -> TimelineResult<V> {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(TimelineError::Invariant("continuous lookup on an empty key set")),
    };

    if q <= first.0 {
        return Ok(first.1);
    }
    if q >= last.0 {
        return Ok(last.1);
    }

    // First key strictly greater than q; q > first key so hi >= 1
    let hi = keys.partition_point(|(k, _)| *k <= q);
    let lo = hi - 1;
    let (lo_key, lo_value) = keys[lo];
    let (hi_key, hi_value) = keys[hi];

    let span = hi_key - lo_key;
    if span <= f32::EPSILON {
        return Ok(hi_value);
    }
    let t = easing_for_segment(lo).apply((q - lo_key) / span);
    Ok(lo_value.lerp(hi_value, t))
}

/// Continuous lookup with one curve for every segment
pub fn continuous_uniform<V: Lerp>(keys: &[(f32, V)], q: f32, easing: Easing) -> TimelineResult<V> {
    continuous(keys, q, |_| easing)
}

/// Round a position to whole pixels
pub fn snap_to_pixel(position: [f32; 2]) -> [f32; 2] {
    [position[0].round(), position[1].round()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in Easing::all() {
            assert!((easing.apply(0.0)).abs() < 1e-6, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{:?} at 1", easing);
        }
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Easing::EaseInQuad.apply(0.5) < 0.5);
        assert!(Easing::EaseOutQuad.apply(0.5) > 0.5);
    }

    #[test]
    fn test_hold_lookup() {
        let keys = [(2usize, "a"), (5, "b"), (9, "c")];
        assert_eq!(hold(&keys, 0), None);
        assert_eq!(hold(&keys, 1), None);
        assert_eq!(hold(&keys, 2), Some(&"a"));
        assert_eq!(hold(&keys, 4), Some(&"a"));
        assert_eq!(hold(&keys, 5), Some(&"b"));
        assert_eq!(hold(&keys, 8), Some(&"b"));
        assert_eq!(hold(&keys, 100), Some(&"c"));
    }

    #[test]
    fn test_continuous_is_identity_at_keys() {
        let keys = [(0.0, 10.0f32), (4.0, 20.0), (10.0, -5.0)];
        for easing in Easing::all() {
            for (k, v) in keys {
                let got = continuous_uniform(&keys, k, *easing).unwrap();
                assert!((got - v).abs() < 1e-5, "{:?} at {}", easing, k);
            }
        }
    }

    #[test]
    fn test_continuous_clamps_and_interpolates() {
        let keys = [(1.0, [0.0f32, 0.0]), (3.0, [10.0, 20.0])];
        assert_eq!(continuous_uniform(&keys, 0.0, Easing::Linear).unwrap(), [0.0, 0.0]);
        assert_eq!(continuous_uniform(&keys, 5.0, Easing::Linear).unwrap(), [10.0, 20.0]);
        assert_eq!(continuous_uniform(&keys, 2.0, Easing::Linear).unwrap(), [5.0, 10.0]);
        let eased = continuous_uniform(&keys, 2.0, Easing::EaseInQuad).unwrap();
        assert!((eased[0] - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_continuous_uses_segment_easing() {
        let keys = [(0.0, 0.0f32), (1.0, 1.0), (2.0, 2.0)];
        let pick = |i: usize| if i == 0 { Easing::Linear } else { Easing::EaseInQuad };
        assert!((continuous(&keys, 0.5, pick).unwrap() - 0.5).abs() < 1e-6);
        assert!((continuous(&keys, 1.5, pick).unwrap() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_continuous_empty_is_invariant_error() {
        let keys: [(f32, f32); 0] = [];
        let err = continuous_uniform(&keys, 1.0, Easing::Linear).unwrap_err();
        assert!(matches!(err, TimelineError::Invariant(_)));
    }

    #[test]
    fn test_snap_to_pixel() {
        assert_eq!(snap_to_pixel([1.4, 2.6]), [1.0, 3.0]);
    }
}
