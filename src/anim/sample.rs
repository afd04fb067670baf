//! Resampling of animation stacks into output curves.
//!
//! Every animated model of a stack is sampled on the union of its native key
//! times and a fixed step grid. At each sample all layers are folded in
//! ascending layer id order, then the accumulated transform is decomposed and
//! converted into position, rotation and scale keys.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::scene::{AnimationLayer, AnimationStack, Document, Matrices, MatrixSlot, Model};
use crate::util::{decompose, quat_is_valid, rot_y, Handle, Quat, Result};

use super::blend::{blend_channel, blend_field, BlendShapeChannels, MAX_BLEND_SHAPE_CHANNELS};
use super::curve::{AnimationCurve, CurveCursor};
use super::output::{
    add_quaternion_key, blend_shape_property, Animation, AnimationCurveBinding, GenericCurve, Keyframe,
    LOCAL_POSITION, LOCAL_ROTATION, LOCAL_SCALE, VISIBILITY,
};

/// Resample every animated stack and store the result in [`AnimationStack::output`].
pub fn post_process_animations(doc: &mut Document) -> Result<()> {
    if !doc.options.imports_animation() {
        return Ok(());
    }
    let handles: Vec<Handle<AnimationStack>> = doc.stacks.handles().collect();
    for handle in handles {
        let mut warnings = Vec::new();
        let output = sample_stack(doc, handle, &mut warnings)?;
        for warning in warnings {
            doc.warn(warning);
        }
        if let Some(animation) = output {
            debug!(
                "animation '{}': {} bindings, {} curves, {:.3}s",
                animation.name,
                animation.bindings.len(),
                animation.curve_count(),
                animation.length
            );
            doc.stacks[handle].output = Some(animation);
        }
    }
    Ok(())
}

/// Sample times of a stack: native key times plus the fixed step grid, within `[start, stop]`.
pub fn sample_times(doc: &Document, stack: &AnimationStack) -> BTreeSet<i64> {
    let start = stack.local_start();
    let stop = stack.local_stop();
    let mut times: BTreeSet<i64> = stack.animated_times.range(start..=stop).copied().collect();

    let frame_step = doc.to_ticks(1.0 / f64::from(doc.settings.frame_rate()));
    let step = (frame_step as f64 * f64::from(doc.options.resample_frequency)) as i64;
    if step > 0 {
        let mut time = start;
        while time <= stop {
            times.insert(time);
            time += step;
        }
    }
    times
}

fn sample_stack(
    doc: &Document,
    handle: Handle<AnimationStack>,
    warnings: &mut Vec<String>,
) -> Result<Option<Animation>> {
    let stack = &doc.stacks[handle];
    if !stack.is_animated() {
        return Ok(None);
    }

    let times = sample_times(doc, stack);
    let mut layers: Vec<&AnimationLayer> = stack
        .layers
        .iter()
        .filter_map(|&l| doc.layers.get(l))
        .filter(|l| l.mute != Some(true))
        .collect();
    layers.sort_by_key(|l| l.layer_id());

    let start = stack.local_start();
    let mut bindings = Vec::with_capacity(stack.animated_models.len());
    for &model in &stack.animated_models {
        let mut sampler = ModelSampler::new(doc, model, &layers);
        for &time in &times {
            sampler.sample(time, doc.to_seconds(time - start))?;
        }
        if sampler.channel_overflow {
            warnings.push(format!(
                "Model [{}] has more than {} blend-shape channels; extra channels are not animated.",
                doc.models[model].info.name, MAX_BLEND_SHAPE_CHANNELS
            ));
        }
        bindings.push(sampler.finish());
    }

    Ok(Some(Animation {
        name: stack.info.name.clone(),
        frame_rate: doc.settings.frame_rate(),
        length: doc.to_seconds(stack.local_stop() - start).max(0.0),
        bindings,
    }))
}

/// Output curves of one model, created on first key.
#[derive(Default)]
struct ModelCurves {
    position: Option<[GenericCurve; 3]>,
    rotation: Option<[GenericCurve; 4]>,
    scale: Option<[GenericCurve; 3]>,
    visibility: Option<GenericCurve>,
    blend_shapes: Vec<GenericCurve>,
}

/// Per-model sampling state: accumulators are reset every sample, cursors persist.
struct ModelSampler<'a> {
    doc: &'a Document,
    handle: Handle<Model>,
    model: &'a Model,
    layers: &'a [&'a AnimationLayer],
    matrices: Matrices,
    channels: BlendShapeChannels,
    cursors: HashMap<Handle<AnimationCurve>, CurveCursor>,
    curves: ModelCurves,
    channel_overflow: bool,
}

impl<'a> ModelSampler<'a> {
    fn new(doc: &'a Document, handle: Handle<Model>, layers: &'a [&'a AnimationLayer]) -> Self {
        Self {
            doc,
            handle,
            model: &doc.models[handle],
            layers,
            matrices: Matrices::new(),
            channels: BlendShapeChannels::new(),
            cursors: HashMap::new(),
            curves: ModelCurves::default(),
            channel_overflow: false,
        }
    }

    /// Fold every layer at `time` and emit the keys of this sample.
    fn sample(&mut self, time: i64, seconds: f32) -> Result<()> {
        if seconds < 0.0 {
            return Ok(());
        }
        self.matrices.reset();
        self.channels.reset();
        for layer in self.layers {
            self.fold_model_curves(layer, time)?;
            if self.doc.options.import_blend_shapes {
                self.fold_blend_shape_curves(layer, time);
            }
        }
        self.emit(seconds);
        Ok(())
    }

    fn fold_model_curves(&mut self, layer: &AnimationLayer, time: i64) -> Result<()> {
        let Some(nodes) = layer.model_curve_nodes.get(&self.handle) else {
            return Ok(());
        };
        let doc = self.doc;
        for &node in nodes {
            let node = &doc.curve_nodes[node];
            let Some(slot) = node.slot() else { continue };
            for binding in &node.curves {
                let Some(field) = binding.field_index() else { continue };
                let curve = &doc.curves[binding.curve];
                if curve.is_empty() {
                    continue;
                }
                let cursor = self.cursors.entry(binding.curve).or_default();
                let value = if slot.is_resampled() {
                    cursor.evaluate(curve, time, doc.time_base)
                } else {
                    match cursor.value_at(curve, time) {
                        Some(v) => v,
                        None => continue,
                    }
                };
                let existing = self.matrices.field(slot, field, None);
                let blended = blend_field(layer, slot, existing, value)?;
                self.matrices.set_field(slot, field, blended);
            }
        }
        Ok(())
    }

    fn fold_blend_shape_curves(&mut self, layer: &AnimationLayer, time: i64) {
        let Some(nodes) = layer.geometry_curve_nodes.get(&self.handle) else {
            return;
        };
        let doc = self.doc;
        for &node in nodes {
            let node = &doc.curve_nodes[node];
            let Some(channel) = node.blend_shape_binding else { continue };
            let Some(index) = self.channels.channel_index(channel_name(doc, channel)) else {
                self.channel_overflow = true;
                continue;
            };
            for binding in &node.curves {
                let curve = &doc.curves[binding.curve];
                let cursor = self.cursors.entry(binding.curve).or_default();
                if let Some(value) = cursor.value_at(curve, time) {
                    let blended = blend_channel(layer, self.channels.value(index), value);
                    self.channels.set(index, blended);
                }
            }
        }
    }

    fn emit(&mut self, seconds: f32) {
        let model = self.model;
        let m = &self.matrices;

        if m.has_slot(MatrixSlot::LclTranslation) || m.has_slot(MatrixSlot::LclRotation) || m.has_slot(MatrixSlot::LclScaling) {
            let local = m.local_matrix(Some(&model.matrices), model.rotation_order());
            let (t, r, s) = decompose(&local);
            let (t, mut r, s) = self.doc.coords.convert_trs(t, r, s, model.is_root_child());
            if model.faces_backward() {
                r *= rot_y(180.0);
            }

            if m.has_slot(MatrixSlot::LclRotation) {
                let r = if quat_is_valid(r) { r } else { Quat::IDENTITY };
                let curves = self.curves.rotation.get_or_insert_with(|| LOCAL_ROTATION.map(GenericCurve::new));
                add_quaternion_key(curves, seconds, r);
            }
            if m.has_slot(MatrixSlot::LclTranslation) {
                let curves = self.curves.position.get_or_insert_with(|| LOCAL_POSITION.map(GenericCurve::new));
                for (curve, value) in curves.iter_mut().zip(t.to_array()) {
                    curve.add_key(Keyframe::new(seconds, value));
                }
            }
            if m.has_slot(MatrixSlot::LclScaling) {
                let curves = self.curves.scale.get_or_insert_with(|| LOCAL_SCALE.map(GenericCurve::new));
                for (curve, value) in curves.iter_mut().zip(s.to_array()) {
                    curve.add_key(Keyframe::new(seconds, value));
                }
            }
        }

        // Channel indices are dense, so output curves line up with them.
        for (index, name) in self.channels.names() {
            if self.curves.blend_shapes.len() == index {
                self.curves.blend_shapes.push(GenericCurve::new(blend_shape_property(name)));
            }
            if self.channels.is_updated(index) {
                self.curves.blend_shapes[index].add_key(Keyframe::new(seconds, self.channels.value(index)));
            }
        }

        if self.doc.options.import_visibility && model.mesh.is_some() && m.has_slot(MatrixSlot::Visibility) {
            let value = m.field(MatrixSlot::Visibility, 0, Some(&model.matrices));
            self.curves
                .visibility
                .get_or_insert_with(|| GenericCurve::new(VISIBILITY))
                .add_key(Keyframe::new(seconds, value));
        }
    }

    /// Blend-shape curves first, then position, rotation, scale and visibility.
    fn finish(self) -> AnimationCurveBinding {
        let ModelCurves { position, rotation, scale, visibility, blend_shapes } = self.curves;
        let mut curves: Vec<GenericCurve> = blend_shapes.into_iter().filter(|c| !c.is_empty()).collect();
        for mut curve in position.into_iter().flatten().chain(rotation.into_iter().flatten()).chain(scale.into_iter().flatten()) {
            curve.set_linear_tangents();
            curves.push(curve);
        }
        curves.extend(visibility);
        AnimationCurveBinding { model: self.handle, curves }
    }
}

/// Output name of a blend-shape channel: its target shape's name, else the channel's own.
fn channel_name(doc: &Document, channel: Handle<crate::scene::BlendShapeChannel>) -> &str {
    let channel = &doc.blend_shape_channels[channel];
    channel
        .shape
        .and_then(|shape| doc.blend_shape_geometries.get(shape))
        .map_or(channel.info.name.as_str(), |shape| shape.info.name.as_str())
}
