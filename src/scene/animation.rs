//! Animation stacks, layers and curve nodes.
//!
//! Curves themselves live in [`crate::anim`]; these objects only describe how
//! curves are grouped and what they drive.

use std::collections::{BTreeMap, BTreeSet};

use crate::anim::{Animation, AnimationCurve};
use crate::util::Handle;

use super::object::scene_object;
use super::{BlendShapeChannel, Geometry, InheritDefaults, Material, MatrixSlot, Model, ObjectInfo};

// ============================================================================
// Layer modes
// ============================================================================

/// How a layer combines with the layers below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Additive,
    Override,
    OverridePassthrough,
}

impl BlendMode {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Override,
            2 => Self::OverridePassthrough,
            _ => Self::Additive,
        }
    }
}

/// Rotation accumulation of additive layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotationAccumulation {
    #[default]
    ByLayer,
    ByChannel,
}

impl RotationAccumulation {
    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            Self::ByChannel
        } else {
            Self::ByLayer
        }
    }
}

/// Scale accumulation of additive layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleAccumulation {
    #[default]
    Multiply,
    Additive,
}

impl ScaleAccumulation {
    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            Self::Additive
        } else {
            Self::Multiply
        }
    }
}

// ============================================================================
// Stack
// ============================================================================

/// `AnimationStack`: one take, made of blended layers.
#[derive(Clone, Debug, Default)]
pub struct AnimationStack {
    pub info: ObjectInfo,
    pub description: Option<String>,
    pub local_start: Option<i64>,
    pub local_stop: Option<i64>,
    pub reference_start: Option<i64>,
    pub reference_stop: Option<i64>,

    /// Connected layers, each at most once.
    pub layers: Vec<Handle<AnimationLayer>>,
    pub layers_count: usize,
    /// Models with at least one curve node on this stack, in discovery order.
    pub animated_models: Vec<Handle<Model>>,
    /// Union of the key times of every curve driving an animated model.
    pub animated_times: BTreeSet<i64>,
    /// Resampled output, filled by animation post-processing.
    pub output: Option<Animation>,
}

scene_object!(AnimationStack, AnimationStack);

impl AnimationStack {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    #[inline]
    pub fn local_start(&self) -> i64 {
        self.local_start.unwrap_or(0)
    }

    /// Last animated key time, or the declared `LocalStop` when nothing is animated.
    pub fn local_stop(&self) -> i64 {
        match self.animated_times.last() {
            Some(&last) => last,
            None => self.local_stop.unwrap_or(0),
        }
    }

    pub fn add_layer(&mut self, layer: Handle<AnimationLayer>) {
        if !self.layers.contains(&layer) {
            self.layers.push(layer);
        }
    }

    /// Register an animated model. Returns false when it was already known.
    pub fn add_animated_model(&mut self, model: Handle<Model>) -> bool {
        if self.animated_models.contains(&model) {
            return false;
        }
        self.animated_models.push(model);
        true
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        !self.animated_models.is_empty()
    }
}

impl InheritDefaults for AnimationStack {
    fn inherit_from(&mut self, t: &Self) {
        if self.description.is_none() {
            self.description.clone_from(&t.description);
        }
        self.local_start = self.local_start.or(t.local_start);
        self.local_stop = self.local_stop.or(t.local_stop);
        self.reference_start = self.reference_start.or(t.reference_start);
        self.reference_stop = self.reference_stop.or(t.reference_stop);
    }
}

// ============================================================================
// Layer
// ============================================================================

/// `AnimationLayer`.
#[derive(Clone, Debug, Default)]
pub struct AnimationLayer {
    pub info: ObjectInfo,
    pub blend_mode: Option<BlendMode>,
    pub rotation_accumulation: Option<RotationAccumulation>,
    pub scale_accumulation: Option<ScaleAccumulation>,
    /// Percentage, 100 when unset.
    pub weight: Option<f32>,
    pub mute: Option<bool>,
    pub solo: Option<bool>,
    pub lock: Option<bool>,
    pub layer_id: Option<i32>,

    pub stacks: Vec<Handle<AnimationStack>>,
    pub curve_nodes: Vec<Handle<AnimationCurveNode>>,
    pub curve_nodes_count: usize,
    /// Curve nodes driving model properties, per model.
    pub model_curve_nodes: BTreeMap<Handle<Model>, Vec<Handle<AnimationCurveNode>>>,
    /// Curve nodes driving blend-shape channels, per owning model.
    pub geometry_curve_nodes: BTreeMap<Handle<Model>, Vec<Handle<AnimationCurveNode>>>,
}

scene_object!(AnimationLayer, AnimationLayer);

impl AnimationLayer {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode.unwrap_or_default()
    }

    #[inline]
    pub fn rotation_accumulation(&self) -> RotationAccumulation {
        self.rotation_accumulation.unwrap_or_default()
    }

    #[inline]
    pub fn scale_accumulation(&self) -> ScaleAccumulation {
        self.scale_accumulation.unwrap_or_default()
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight.unwrap_or(100.0)
    }

    #[inline]
    pub fn layer_id(&self) -> i32 {
        self.layer_id.unwrap_or(0)
    }

    pub fn add_curve_node(&mut self, node: Handle<AnimationCurveNode>) {
        if self.curve_nodes.capacity() < self.curve_nodes_count {
            self.curve_nodes.reserve_exact(self.curve_nodes_count - self.curve_nodes.len());
        }
        self.curve_nodes.push(node);
    }

    pub fn add_stack(&mut self, stack: Handle<AnimationStack>) {
        if !self.stacks.contains(&stack) {
            self.stacks.push(stack);
        }
    }
}

impl InheritDefaults for AnimationLayer {
    fn inherit_from(&mut self, t: &Self) {
        self.blend_mode = self.blend_mode.or(t.blend_mode);
        self.rotation_accumulation = self.rotation_accumulation.or(t.rotation_accumulation);
        self.scale_accumulation = self.scale_accumulation.or(t.scale_accumulation);
        self.weight = self.weight.or(t.weight);
        self.mute = self.mute.or(t.mute);
        self.solo = self.solo.or(t.solo);
        self.lock = self.lock.or(t.lock);
        self.layer_id = self.layer_id.or(t.layer_id);
    }
}

// ============================================================================
// Curve node
// ============================================================================

/// Curve bound to one component of its node (`-1` when the property is unknown).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveBinding {
    pub curve: Handle<AnimationCurve>,
    pub field: i32,
}

impl CurveBinding {
    /// Component index from an OP connection property (`d|X`, `d|Y`, ...).
    pub fn field_from_property(property: &str) -> i32 {
        match property.rsplit('|').next().unwrap_or(property) {
            "X" | "Visibility" => 0,
            "Y" => 1,
            "Z" => 2,
            _ => -1,
        }
    }

    /// Component index, `None` when the curve drives nothing.
    #[inline]
    pub fn field_index(&self) -> Option<usize> {
        usize::try_from(self.field).ok()
    }
}

/// `AnimationCurveNode`: groups the curves of one animated property.
#[derive(Clone, Debug, Default)]
pub struct AnimationCurveNode {
    pub info: ObjectInfo,
    pub dx: Option<f32>,
    pub dy: Option<f32>,
    pub dz: Option<f32>,
    pub deform_percent: Option<f32>,
    pub visibility: Option<f32>,

    /// Model property driven by this node.
    pub model_binding: Option<(Handle<Model>, MatrixSlot)>,
    pub geometry_binding: Option<Handle<Geometry>>,
    pub blend_shape_binding: Option<Handle<BlendShapeChannel>>,
    /// Material and driven property name.
    pub material_binding: Option<(Handle<Material>, String)>,

    pub layer: Option<Handle<AnimationLayer>>,
    pub curves: Vec<CurveBinding>,
    pub curves_count: usize,
}

scene_object!(AnimationCurveNode, AnimationCurveNode);

impl AnimationCurveNode {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    pub fn add_curve(&mut self, curve: Handle<AnimationCurve>, field: i32) {
        if self.curves.capacity() < self.curves_count {
            self.curves.reserve_exact(self.curves_count - self.curves.len());
        }
        self.curves.push(CurveBinding { curve, field });
    }

    /// Model slot driven by the node, if any.
    #[inline]
    pub fn slot(&self) -> Option<MatrixSlot> {
        self.model_binding.map(|(_, slot)| slot)
    }
}

impl InheritDefaults for AnimationCurveNode {
    fn inherit_from(&mut self, t: &Self) {
        self.dx = self.dx.or(t.dx);
        self.dy = self.dy.or(t.dy);
        self.dz = self.dz.or(t.dz);
        self.deform_percent = self.deform_percent.or(t.deform_percent);
        self.visibility = self.visibility.or(t.visibility);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tokens() {
        assert_eq!(BlendMode::from_i32(0), BlendMode::Additive);
        assert_eq!(BlendMode::from_i32(2), BlendMode::OverridePassthrough);
        assert_eq!(RotationAccumulation::from_i32(1), RotationAccumulation::ByChannel);
        assert_eq!(ScaleAccumulation::from_i32(1), ScaleAccumulation::Additive);
        assert_eq!(ScaleAccumulation::from_i32(7), ScaleAccumulation::Multiply);
    }

    #[test]
    fn test_local_stop_prefers_keys() {
        let mut stack = AnimationStack::new(ObjectInfo::new(1, "Take 001", ""));
        stack.local_stop = Some(500);
        assert_eq!(stack.local_stop(), 500);
        stack.animated_times.extend([10, 90, 40]);
        assert_eq!(stack.local_stop(), 90);
    }

    #[test]
    fn test_stack_sets_are_unique() {
        let mut stack = AnimationStack::default();
        stack.add_layer(Handle::new(0));
        stack.add_layer(Handle::new(0));
        assert_eq!(stack.layers.len(), 1);
        assert!(stack.add_animated_model(Handle::new(3)));
        assert!(!stack.add_animated_model(Handle::new(3)));
    }

    #[test]
    fn test_layer_defaults() {
        let layer = AnimationLayer::default();
        assert_eq!(layer.weight(), 100.0);
        assert_eq!(layer.blend_mode(), BlendMode::Additive);

        let mut template = AnimationLayer::default();
        template.weight = Some(50.0);
        let mut own = AnimationLayer::new(ObjectInfo::new(2, "BaseLayer", ""));
        own.blend_mode = Some(BlendMode::Override);
        own.inherit_from(&template);
        assert_eq!(own.weight(), 50.0);
        assert_eq!(own.blend_mode(), BlendMode::Override);
    }

    #[test]
    fn test_field_from_property() {
        assert_eq!(CurveBinding::field_from_property("d|X"), 0);
        assert_eq!(CurveBinding::field_from_property("d|Y"), 1);
        assert_eq!(CurveBinding::field_from_property("d|Z"), 2);
        assert_eq!(CurveBinding::field_from_property("d|Visibility"), 0);
        assert_eq!(CurveBinding::field_from_property("d|DeformPercent"), -1);
        let binding = CurveBinding { curve: Handle::new(0), field: -1 };
        assert_eq!(binding.field_index(), None);
    }
}
