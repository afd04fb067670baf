//! Resampled animation output: generic keyframe curves per animated model.

use crate::scene::Model;
use crate::util::{Handle, Quat};

use super::curve::{hermite, inverse_lerp};

pub const LOCAL_POSITION: [&str; 3] = ["localPosition.x", "localPosition.y", "localPosition.z"];
pub const LOCAL_ROTATION: [&str; 4] = ["localRotation.x", "localRotation.y", "localRotation.z", "localRotation.w"];
pub const LOCAL_SCALE: [&str; 3] = ["localScale.x", "localScale.y", "localScale.z"];
pub const VISIBILITY: &str = "visibility";

/// Output property of a blend-shape channel.
pub fn blend_shape_property(channel: &str) -> String {
    format!("blendShape.{channel}")
}

/// Key of an output curve. Time in seconds from the start of the take.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value, in_tangent: 0.0, out_tangent: 0.0 }
    }
}

/// Keys of one output property, sorted by time with unique times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenericCurve {
    pub property: String,
    pub keys: Vec<Keyframe>,
}

impl GenericCurve {
    pub fn new(property: impl Into<String>) -> Self {
        Self { property: property.into(), keys: Vec::new() }
    }

    /// Insert a key, replacing any key at the same time.
    pub fn add_key(&mut self, key: Keyframe) {
        match self.keys.last() {
            Some(last) if last.time < key.time => self.keys.push(key),
            None => self.keys.push(key),
            _ => match self.keys.binary_search_by(|k| k.time.total_cmp(&key.time)) {
                Ok(i) => self.keys[i] = key,
                Err(i) => self.keys.insert(i, key),
            },
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Linear tangents: interior keys slope towards each neighbor, end keys are flat.
    pub fn set_linear_tangents(&mut self) {
        let count = self.keys.len();
        for i in 0..count {
            let (in_tangent, out_tangent) = if i == 0 || i + 1 == count {
                (0.0, 0.0)
            } else {
                let (prev, key, next) = (self.keys[i - 1], self.keys[i], self.keys[i + 1]);
                (
                    finite_or_zero((key.value - prev.value) / (key.time - prev.time)),
                    finite_or_zero((next.value - key.value) / (next.time - key.time)),
                )
            };
            self.keys[i].in_tangent = in_tangent;
            self.keys[i].out_tangent = out_tangent;
        }
    }

    /// Value at `time`: clamped to the end keys, Hermite between keys.
    pub fn sample(&self, time: f32) -> Option<f32> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        let b = self.keys.partition_point(|k| k.time <= time);
        let (ka, kb) = (self.keys[b - 1], self.keys[b]);
        let dt = kb.time - ka.time;
        let t = inverse_lerp(ka.time, kb.time, time);
        Some(hermite(ka.value, kb.value, ka.out_tangent * dt, kb.in_tangent * dt, t))
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Add one rotation key to the x/y/z/w curves, keeping the quaternion on the
/// same hemisphere as the previous key.
pub fn add_quaternion_key(curves: &mut [GenericCurve; 4], time: f32, rotation: Quat) {
    let previous = match (curves[0].keys.last(), curves[1].keys.last(), curves[2].keys.last(), curves[3].keys.last()) {
        (Some(x), Some(y), Some(z), Some(w)) => Some(Quat::from_xyzw(x.value, y.value, z.value, w.value)),
        _ => None,
    };
    let rotation = match previous {
        Some(prev) if prev.dot(rotation) < 0.0 => -rotation,
        _ => rotation,
    };
    for (curve, value) in curves.iter_mut().zip(rotation.to_array()) {
        curve.add_key(Keyframe::new(time, value));
    }
}

/// Output curves of one model.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationCurveBinding {
    pub model: Handle<Model>,
    pub curves: Vec<GenericCurve>,
}

impl AnimationCurveBinding {
    pub fn curve(&self, property: &str) -> Option<&GenericCurve> {
        self.curves.iter().find(|c| c.property == property)
    }
}

/// Resampled take of one animation stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    pub name: String,
    pub frame_rate: f32,
    /// Seconds.
    pub length: f32,
    pub bindings: Vec<AnimationCurveBinding>,
}

impl Animation {
    pub fn binding(&self, model: Handle<Model>) -> Option<&AnimationCurveBinding> {
        self.bindings.iter().find(|b| b.model == model)
    }

    pub fn curve_count(&self) -> usize {
        self.bindings.iter().map(|b| b.curves.len()).sum()
    }
}
