//! Animation stacks, layers, curve nodes and curves.

use crate::anim::{AnimationCurve, Extrapolation, ExtrapolationMode};
use crate::node::{Node, NodeTag, Property};
use crate::scene::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BlendMode, Document, ObjectInfo, RotationAccumulation,
    ScaleAccumulation,
};

use super::{definition_slot, set, ObjectBuilder};

impl ObjectBuilder for AnimationStack {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut stack = AnimationStack::new(info);
        for entry in node.properties70() {
            match entry.name() {
                "Description" => set(&mut stack.description, entry.str().map(str::to_string)),
                "LocalStart" => set(&mut stack.local_start, entry.i64()),
                "LocalStop" => set(&mut stack.local_stop, entry.i64()),
                "ReferenceStart" => set(&mut stack.reference_start, entry.i64()),
                "ReferenceStop" => set(&mut stack.reference_stop, entry.i64()),
                _ => {}
            }
        }
        stack
    }

    definition_slot!(stacks);
}

impl ObjectBuilder for AnimationLayer {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut layer = AnimationLayer::new(info);
        for entry in node.properties70() {
            let l = &mut layer;
            match entry.name() {
                "Weight" => set(&mut l.weight, entry.f32()),
                "Mute" => set(&mut l.mute, entry.bool()),
                "Solo" => set(&mut l.solo, entry.bool()),
                "Lock" => set(&mut l.lock, entry.bool()),
                "BlendMode" => set(&mut l.blend_mode, entry.i32().map(BlendMode::from_i32)),
                "RotationAccumulationMode" => {
                    set(&mut l.rotation_accumulation, entry.i32().map(RotationAccumulation::from_i32))
                }
                "ScaleAccumulationMode" => set(&mut l.scale_accumulation, entry.i32().map(ScaleAccumulation::from_i32)),
                "mLayerID" => set(&mut l.layer_id, entry.i32()),
                _ => {}
            }
        }
        layer
    }

    definition_slot!(layers);
}

impl ObjectBuilder for AnimationCurveNode {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut curve_node = AnimationCurveNode::new(info);
        for entry in node.properties70() {
            let n = &mut curve_node;
            match entry.name() {
                "d|X" => set(&mut n.dx, entry.f32()),
                "d|Y" => set(&mut n.dy, entry.f32()),
                "d|Z" => set(&mut n.dz, entry.f32()),
                "d|DeformPercent" => set(&mut n.deform_percent, entry.f32()),
                "d|Visibility" => set(&mut n.visibility, entry.f32()),
                _ => {}
            }
        }
        curve_node
    }

    definition_slot!(curve_nodes);
}

impl ObjectBuilder for AnimationCurve {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut curve = AnimationCurve::new(info);
        curve.default = node.child_named("Default").and_then(|n| n.f32_at(0));
        if curve.info.is_template() {
            return curve;
        }

        let array = |tag| node.child(tag);
        curve.key_times = array(NodeTag::KeyTime).map(Node::i64_array).unwrap_or_default();
        curve.key_values = array(NodeTag::KeyValueFloat).map(Node::f32_array).unwrap_or_default();
        curve.key_attr_data = array(NodeTag::KeyAttrDataFloat).map(attr_data).unwrap_or_default();
        curve.key_attr_ref_count = array(NodeTag::KeyAttrRefCount).map(Node::i32_array).unwrap_or_default();
        curve.key_attr_flags = array(NodeTag::KeyAttrFlags).map(Node::i32_array).unwrap_or_default();
        if let Some(pre) = array(NodeTag::PreExtrapolation) {
            curve.pre_extrapolation = extrapolation(pre);
        }
        if let Some(post) = array(NodeTag::PostExtrapolation) {
            curve.post_extrapolation = extrapolation(post);
        }
        curve
    }
}

/// `KeyAttrDataFloat` holds raw float bits. ASCII files write them as
/// integers, which are reinterpreted rather than converted.
fn attr_data(node: &Node) -> Vec<f32> {
    node.properties()
        .iter()
        .flat_map(|p| match p {
            Property::I32Array(bits) => bits.iter().map(|&b| f32::from_bits(b as u32)).collect(),
            Property::I64Array(bits) => bits.iter().map(|&b| f32::from_bits(b as u32)).collect(),
            Property::I16(b) => vec![f32::from_bits(*b as i32 as u32)],
            Property::I32(b) => vec![f32::from_bits(*b as u32)],
            Property::I64(b) => vec![f32::from_bits(*b as u32)],
            other => other.to_f32_vec(),
        })
        .collect()
}

fn extrapolation(node: &Node) -> Extrapolation {
    let mut result = Extrapolation::default();
    if let Some(token) = node.child(NodeTag::Type).and_then(|t| t.str_at(0)) {
        result.mode = ExtrapolationMode::from_token(token);
    }
    if let Some(repetition) = node.child(NodeTag::Repetition).and_then(|r| r.i32_at(0)) {
        result.repetition = repetition;
    }
    result
}
