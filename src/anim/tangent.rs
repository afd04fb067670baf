//! Key tangent reconstruction.
//!
//! Files store authored slopes only for user tangents. Auto, TCB and break
//! keys are re-solved here from their neighbors, following the FBX SDK rules
//! for clamping, time independence and progressive clamping.

use crate::core::TimeBase;

use super::curve::{AnimationCurve, KeyTangent};
use super::flags::KeyFlags;

/// Attribute block layout, four floats per block.
const RIGHT_SLOPE: usize = 0;
const NEXT_LEFT_SLOPE: usize = 1;
const WEIGHTS: usize = 2;
const ATTR_STRIDE: usize = 4;

/// Weight of a key side with no authored weight.
const DEFAULT_WEIGHT: f32 = 0.333_333;
/// Flat keys closer than this to a neighbor are clamped.
const CLAMP_THRESHOLD: f32 = 0.1;
/// Left and right slope differ when their sum exceeds this.
const BROKEN_SLOPE_EPSILON: f32 = 0.0001;

/// Split the packed weight float into right and next-left weights.
///
/// The float's bits hold two little-endian `i16` in units of 1/10000.
pub fn unpack_weights(packed: f32) -> (f32, f32) {
    let bits = packed.to_bits();
    let right = (bits & 0xFFFF) as u16 as i16;
    let next_left = (bits >> 16) as u16 as i16;
    (right as f32 / 10_000.0, next_left as f32 / 10_000.0)
}

/// Inverse of [`unpack_weights`].
pub fn pack_weights(right: f32, next_left: f32) -> f32 {
    let right = (right * 10_000.0).round() as i16 as u16 as u32;
    let next_left = (next_left * 10_000.0).round() as i16 as u16 as u32;
    f32::from_bits(right | (next_left << 16))
}

/// Times and values of a key and its clamped neighbors.
#[derive(Clone, Copy, Debug)]
struct Neighborhood {
    prev_time: f32,
    time: f32,
    next_time: f32,
    prev_value: f32,
    value: f32,
    next_value: f32,
}

/// Solve every key's tangents. Returns one entry per key.
pub fn solve_tangents(curve: &AnimationCurve, time_base: TimeBase) -> Vec<KeyTangent> {
    let count = curve.key_count();
    let mut tangents = Vec::with_capacity(count);

    let mut attr_index = 0usize;
    let mut attr_element = 0usize;
    let mut slope_left = 0.0f32;
    let mut weight_left = DEFAULT_WEIGHT;

    for key in 0..count {
        let ref_count = curve.key_attr_ref_count.get(attr_index).copied().unwrap_or(1).max(1) as usize;
        let flags = curve.flags_of_block(attr_index);
        let base = attr_index * ATTR_STRIDE;
        let (right_weight, next_left_weight) = unpack_weights(curve.attr(base + WEIGHTS));

        let prev = key.saturating_sub(1);
        let next = (key + 1).min(count - 1);
        let n = Neighborhood {
            prev_time: curve.key_seconds(prev, time_base),
            time: curve.key_seconds(key, time_base),
            next_time: curve.key_seconds(next, time_base),
            prev_value: curve.key_values[prev],
            value: curve.key_values[key],
            next_value: curve.key_values[next],
        };

        let mut slope_right = curve.attr(base + RIGHT_SLOPE);
        let mut weight_right = right_weight;
        let mut next_slope_left = curve.attr(base + NEXT_LEFT_SLOPE);
        let mut next_weight_left = next_left_weight;

        if flags.is_constant() {
            weight_right = DEFAULT_WEIGHT;
            next_weight_left = DEFAULT_WEIGHT;
            slope_right = 0.0;
            next_slope_left = 0.0;
        } else if flags.is_cubic() && !flags.is_user() {
            let has_prev = key > 0 && n.time > n.prev_time;
            let has_next = key + 1 < count && n.next_time > n.time;
            if has_prev && has_next {
                if (slope_left + slope_right).abs() <= BROKEN_SLOPE_EPSILON {
                    let slope = solve_auto_tangent(&n, weight_left, weight_right, flags, slope_right);
                    slope_left = slope;
                    slope_right = slope;
                } else {
                    let left = solve_auto_tangent(&n, weight_left, weight_right, flags, -slope_left);
                    let right = solve_auto_tangent(&n, weight_left, weight_right, flags, slope_right);
                    slope_left = left;
                    slope_right = right;
                }
            } else if has_prev {
                let slope = solve_auto_tangent_left(&n, -slope_left, flags);
                slope_left = slope;
                slope_right = slope;
            } else if has_next {
                let slope = solve_auto_tangent_right(&n, slope_right, flags);
                slope_left = slope;
                slope_right = slope;
            } else {
                slope_left = 0.0;
                slope_right = 0.0;
            }
        }

        let mut tangent = KeyTangent::default();
        if n.time > n.prev_time {
            tangent.weight_left = weight_left * (n.time - n.prev_time);
            tangent.slope_left = slope_left;
        }
        if n.next_time > n.time {
            tangent.weight_right = weight_right * (n.next_time - n.time);
            tangent.slope_right = slope_right;
        }
        tangents.push(tangent);

        slope_left = next_slope_left;
        weight_left = next_weight_left;

        attr_element += 1;
        if attr_element >= ref_count {
            attr_index += 1;
            attr_element = 0;
        }
    }
    tangents
}

/// Extra slope from a large auto bias, used by the one-sided solvers.
fn one_sided_bias(slope: f32, auto_bias: f32, flags: KeyFlags) -> f32 {
    if !flags.is_time_independent() {
        return slope;
    }
    let abs_bias_weight = auto_bias.abs() / 100.0 - 5.0;
    if abs_bias_weight > 0.0 {
        let sign = if auto_bias > 0.0 { 1.0 } else { -1.0 };
        slope + abs_bias_weight * abs_bias_weight * sign * 40.0
    } else {
        slope
    }
}

/// Slope of a last key: only the left neighbor is usable.
fn solve_auto_tangent_left(n: &Neighborhood, auto_bias: f32, flags: KeyFlags) -> f32 {
    if flags.is_clamp_progressive() {
        return 0.0;
    }
    if flags.is_clamp() && (n.prev_value - n.value).abs() <= CLAMP_THRESHOLD {
        return 0.0;
    }
    let slope = (n.value - n.prev_value) / (n.time - n.prev_time);
    one_sided_bias(slope, auto_bias, flags)
}

/// Slope of a first key: only the right neighbor is usable.
fn solve_auto_tangent_right(n: &Neighborhood, auto_bias: f32, flags: KeyFlags) -> f32 {
    if flags.is_clamp_progressive() {
        return 0.0;
    }
    if flags.is_clamp() && (n.next_value - n.value).abs() <= CLAMP_THRESHOLD {
        return 0.0;
    }
    let slope = (n.next_value - n.value) / (n.next_time - n.time);
    one_sided_bias(slope, auto_bias, flags)
}

/// Slope of a key with both neighbors strictly before and after it.
fn solve_auto_tangent(n: &Neighborhood, weight_left: f32, weight_right: f32, flags: KeyFlags, auto_bias: f32) -> f32 {
    if flags.is_clamp() {
        let closest = (n.prev_value - n.value).abs().min((n.next_value - n.value).abs());
        if closest <= CLAMP_THRESHOLD {
            return 0.0;
        }
    }

    let mut slope = (n.next_value - n.prev_value) / (n.next_time - n.prev_time);

    if flags.is_time_independent() {
        let slope_left = (n.value - n.prev_value) / (n.time - n.prev_time);
        let slope_right = (n.next_value - n.value) / (n.next_time - n.time);
        let delta = (n.time - n.prev_time) / (n.next_time - n.prev_time);
        slope = slope * 0.5 + (slope_left * (1.0 - delta) + slope_right * delta) * 0.5;

        let bias_weight = auto_bias.abs() / 100.0;
        if bias_weight > 0.0001 {
            let bias_target = if auto_bias > 0.0 { slope_right } else { slope_left };
            let bias_delta = bias_target - slope;
            slope = slope * (1.0 - bias_weight) + bias_target * bias_weight;

            let abs_bias_weight = bias_weight - 5.0;
            if abs_bias_weight > 0.0 {
                let sign_source = if bias_delta.abs() > 0.00001 { bias_delta } else { auto_bias };
                let sign = if sign_source > 0.0 { 1.0 } else { -1.0 };
                slope += abs_bias_weight * abs_bias_weight * sign * 40.0;
            }
        }
    }

    if flags.is_clamp_progressive() {
        let sign = if slope >= 0.0 { 1.0 } else { -1.0 };
        let mut abs_slope = sign * slope;
        let range_left = weight_left * (n.time - n.prev_time);
        let range_right = weight_right * (n.next_time - n.time);
        let mut max_left = if range_left > 0.0 { sign * (n.value - n.prev_value) / range_left } else { 0.0 };
        let mut max_right = if range_right > 0.0 { sign * (n.next_value - n.value) / range_right } else { 0.0 };
        // NaN fails the comparison and is flattened too.
        if !(max_left > 0.0) {
            max_left = 0.0;
        }
        if !(max_right > 0.0) {
            max_right = 0.0;
        }
        abs_slope = abs_slope.min(max_left).min(max_right);
        slope = sign * abs_slope;
    }

    slope
}
