//! Layer blending of sampled values.

use std::collections::HashMap;

use crate::scene::{AnimationLayer, BlendMode, MatrixSlot, RotationAccumulation, ScaleAccumulation};
use crate::util::{Error, Result};

/// Most blend-shape channels tracked per model.
pub const MAX_BLEND_SHAPE_CHANNELS: usize = 2048;

/// Combine a layer's sampled `value` with the value accumulated from the layers below.
///
/// Fails for additive rotation accumulated by channel, which has no defined result.
pub fn blend_field(layer: &AnimationLayer, slot: MatrixSlot, existing: f32, value: f32) -> Result<f32> {
    let weight = layer.weight() / 100.0;
    let blended = match layer.blend_mode() {
        BlendMode::Additive => match slot {
            MatrixSlot::LclScaling => match layer.scale_accumulation() {
                ScaleAccumulation::Additive => existing + value,
                ScaleAccumulation::Multiply => existing.powf(weight) * value,
            },
            MatrixSlot::LclRotation => match layer.rotation_accumulation() {
                RotationAccumulation::ByChannel => return Err(Error::UnsupportedRotationAccumulation),
                RotationAccumulation::ByLayer => existing + value * weight,
            },
            _ => existing + value * weight,
        },
        BlendMode::Override => value * weight,
        BlendMode::OverridePassthrough => lerp(existing, value, weight),
    };
    Ok(blended)
}

/// Blend a blend-shape channel weight. Channels have no accumulation modes.
pub fn blend_channel(layer: &AnimationLayer, existing: f32, value: f32) -> f32 {
    let weight = layer.weight() / 100.0;
    match layer.blend_mode() {
        BlendMode::Additive => existing + value * weight,
        BlendMode::Override => value * weight,
        BlendMode::OverridePassthrough => lerp(existing, value, weight),
    }
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Per-sample blend-shape channel weights of one model.
///
/// Channel indices are handed out in first-seen order and stay stable across
/// samples; values are cleared by [`reset`](Self::reset).
#[derive(Clone, Debug, Default)]
pub struct BlendShapeChannels {
    indices: HashMap<String, usize>,
    names: Vec<String>,
    values: Vec<f32>,
    updated: Vec<bool>,
}

impl BlendShapeChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of a channel, allocating it on first use. `None` once the channel limit is reached.
    pub fn channel_index(&mut self, name: &str) -> Option<usize> {
        if let Some(&index) = self.indices.get(name) {
            return Some(index);
        }
        if self.names.len() >= MAX_BLEND_SHAPE_CHANNELS {
            return None;
        }
        let index = self.names.len();
        self.indices.insert(name.to_string(), index);
        self.names.push(name.to_string());
        self.values.push(0.0);
        self.updated.push(false);
        Some(index)
    }

    pub fn value(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
            self.updated[index] = true;
        }
    }

    pub fn is_updated(&self, index: usize) -> bool {
        self.updated.get(index).copied().unwrap_or(false)
    }

    /// Clear values for the next sample; channel indices survive.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.updated.iter_mut().for_each(|u| *u = false);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Channels in index order.
    pub fn names(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(mode: BlendMode, weight: f32) -> AnimationLayer {
        let mut layer = AnimationLayer::default();
        layer.blend_mode = Some(mode);
        layer.weight = Some(weight);
        layer
    }

    #[test]
    fn test_override_passthrough_stack() {
        let base = layer(BlendMode::OverridePassthrough, 100.0);
        let top = layer(BlendMode::OverridePassthrough, 50.0);
        let v = blend_field(&base, MatrixSlot::LclTranslation, 0.0, 10.0).unwrap();
        let v = blend_field(&top, MatrixSlot::LclTranslation, v, 20.0).unwrap();
        assert_eq!(v, 15.0);
    }

    #[test]
    fn test_additive_modes() {
        let add = layer(BlendMode::Additive, 50.0);
        assert_eq!(blend_field(&add, MatrixSlot::LclTranslation, 1.0, 4.0).unwrap(), 3.0);
        assert_eq!(blend_field(&add, MatrixSlot::LclRotation, 10.0, 20.0).unwrap(), 20.0);
        // 4^0.5 * 3
        assert_eq!(blend_field(&add, MatrixSlot::LclScaling, 4.0, 3.0).unwrap(), 6.0);

        let mut additive_scale = layer(BlendMode::Additive, 50.0);
        additive_scale.scale_accumulation = Some(ScaleAccumulation::Additive);
        assert_eq!(blend_field(&additive_scale, MatrixSlot::LclScaling, 1.0, 2.0).unwrap(), 3.0);
    }

    #[test]
    fn test_override_scales_by_weight() {
        let over = layer(BlendMode::Override, 25.0);
        assert_eq!(blend_field(&over, MatrixSlot::Visibility, 9.0, 4.0).unwrap(), 1.0);
        assert_eq!(blend_channel(&over, 9.0, 40.0), 10.0);
    }

    #[test]
    fn test_rotation_by_channel_fails() {
        let mut add = layer(BlendMode::Additive, 100.0);
        add.rotation_accumulation = Some(RotationAccumulation::ByChannel);
        let err = blend_field(&add, MatrixSlot::LclRotation, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRotationAccumulation));
        // Other slots are unaffected.
        assert!(blend_field(&add, MatrixSlot::LclTranslation, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_channels_keep_indices_across_resets() {
        let mut channels = BlendShapeChannels::new();
        let smile = channels.channel_index("Smile").unwrap();
        let blink = channels.channel_index("Blink").unwrap();
        assert_eq!((smile, blink), (0, 1));
        channels.set(blink, 40.0);
        assert!(channels.is_updated(blink));
        assert!(!channels.is_updated(smile));

        channels.reset();
        assert_eq!(channels.value(blink), 0.0);
        assert!(!channels.is_updated(blink));
        assert_eq!(channels.channel_index("Blink"), Some(1));
        assert_eq!(channels.len(), 2);
    }

    #[test]
    fn test_channel_limit() {
        let mut channels = BlendShapeChannels::new();
        for i in 0..MAX_BLEND_SHAPE_CHANNELS {
            assert!(channels.channel_index(&format!("c{i}")).is_some());
        }
        assert_eq!(channels.channel_index("overflow"), None);
        assert_eq!(channels.channel_index("c0"), Some(0));
    }
}
