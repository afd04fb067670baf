//! Keyframed scalar curves (`AnimationCurve` objects).
//!
//! Key arrays come straight from the node tree. [`AnimationCurve::initialize`]
//! solves the per-key tangents once; afterwards the curve is read through a
//! [`CurveCursor`], either by key lookup or by Hermite evaluation.

use crate::core::TimeBase;
use crate::scene::{scene_object, InheritDefaults, ObjectInfo};

use super::flags::{Extrapolation, KeyFlags};
use super::tangent;

/// Solved tangents of one key. Weights are already scaled by the time to the neighbor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyTangent {
    pub slope_left: f32,
    pub weight_left: f32,
    pub slope_right: f32,
    pub weight_right: f32,
}

/// `AnimationCurve`: parallel key arrays plus attribute blocks.
#[derive(Clone, Debug, Default)]
pub struct AnimationCurve {
    pub info: ObjectInfo,
    pub default: Option<f32>,
    /// Key times in ticks.
    pub key_times: Vec<i64>,
    pub key_values: Vec<f32>,
    /// Number of consecutive keys sharing each attribute block.
    pub key_attr_ref_count: Vec<i32>,
    /// Four floats per attribute block: right slope, next-left slope, packed weights, velocity.
    pub key_attr_data: Vec<f32>,
    /// One flag word per attribute block.
    pub key_attr_flags: Vec<i32>,
    pub pre_extrapolation: Extrapolation,
    pub post_extrapolation: Extrapolation,

    tangents: Vec<KeyTangent>,
    initialized: bool,
}

scene_object!(AnimationCurve, AnimationCurve);

impl AnimationCurve {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.key_times.len().min(self.key_values.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Solve key tangents. Later calls are no-ops.
    pub fn initialize(&mut self, time_base: TimeBase) {
        if self.initialized {
            return;
        }
        self.tangents = tangent::solve_tangents(self, time_base);
        self.initialized = true;
    }

    /// Tangents of a key, flat defaults before [`initialize`](Self::initialize).
    pub fn tangent(&self, key: usize) -> KeyTangent {
        self.tangents.get(key).copied().unwrap_or_default()
    }

    pub fn tangents(&self) -> &[KeyTangent] {
        &self.tangents
    }

    /// Flags of the attribute block covering `key`.
    pub fn key_flags(&self, key: usize) -> KeyFlags {
        let mut remaining = key;
        for (block, &count) in self.key_attr_ref_count.iter().enumerate() {
            let count = count.max(1) as usize;
            if remaining < count {
                return self.flags_of_block(block);
            }
            remaining -= count;
        }
        KeyFlags::default()
    }

    pub(crate) fn flags_of_block(&self, block: usize) -> KeyFlags {
        self.key_attr_flags.get(block).copied().map(KeyFlags::from_i32).unwrap_or_default()
    }

    /// Attribute float, zero past the end of the data.
    pub(crate) fn attr(&self, index: usize) -> f32 {
        self.key_attr_data.get(index).copied().unwrap_or(0.0)
    }

    /// Key time in seconds.
    #[inline]
    pub fn key_seconds(&self, key: usize, time_base: TimeBase) -> f32 {
        time_base.to_seconds(self.key_times[key])
    }

    /// First and last key time in ticks.
    pub fn time_range(&self) -> Option<(i64, i64)> {
        let count = self.key_count();
        if count == 0 {
            return None;
        }
        Some((self.key_times[0], self.key_times[count - 1]))
    }
}

impl InheritDefaults for AnimationCurve {
    fn inherit_from(&mut self, t: &Self) {
        self.default = self.default.or(t.default);
    }
}

/// Monotonic read position into one curve.
///
/// Queries must come in non-decreasing time order; the cursor never moves back.
/// Use one cursor per curve and sampling pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurveCursor {
    last: usize,
}

impl CurveCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the last key at or before `time`, or the first key when `time`
    /// precedes every key.
    ///
    /// Step channels hold the preceding key until the next one is reached;
    /// the lookup never snaps forward to the first key after `time`.
    pub fn key_at(&mut self, curve: &AnimationCurve, time: i64) -> Option<usize> {
        let count = curve.key_count();
        if count == 0 {
            return None;
        }
        while self.last + 1 < count && curve.key_times[self.last + 1] <= time {
            self.last += 1;
        }
        Some(self.last)
    }

    /// Value of [`key_at`](Self::key_at).
    pub fn value_at(&mut self, curve: &AnimationCurve, time: i64) -> Option<f32> {
        self.key_at(curve, time).map(|key| curve.key_values[key])
    }

    /// Keys bracketing `time`: the first key after `time` (clamped to the last
    /// key) and the one before it.
    pub fn two_keys(&mut self, curve: &AnimationCurve, time: i64) -> Option<(usize, usize)> {
        let count = curve.key_count();
        if count == 0 {
            return None;
        }
        while self.last + 1 < count && curve.key_times[self.last] <= time {
            self.last += 1;
        }
        let b = self.last;
        let a = b.saturating_sub(1);
        Some((a, b))
    }

    /// Hermite evaluation between the bracketing keys. Empty curves evaluate to zero.
    pub fn evaluate(&mut self, curve: &AnimationCurve, time: i64, time_base: TimeBase) -> f32 {
        let Some((a, b)) = self.two_keys(curve, time) else {
            return 0.0;
        };
        let time_a = curve.key_seconds(a, time_base);
        let time_b = curve.key_seconds(b, time_base);
        let value_a = curve.key_values[a];
        let value_b = curve.key_values[b];

        let dt = time_b - time_a;
        let t = inverse_lerp(time_a, time_b, time_base.to_seconds(time));
        let m0 = curve.tangent(a).slope_right * dt;
        let m1 = curve.tangent(b).slope_left * dt;
        hermite(value_a, value_b, m0, m1, t)
    }
}

/// Position of `value` between `a` and `b`, clamped to `[0, 1]`. Zero when `a == b`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Cubic Hermite spline: `h00*p0 + h10*m0 + h11*m1 + h01*p1`.
#[inline]
pub fn hermite(p0: f32, p1: f32, m0: f32, m1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h11 = t3 - t2;
    let h01 = -2.0 * t3 + 3.0 * t2;
    h00 * p0 + h10 * m0 + h11 * m1 + h01 * p1
}
