//! Skin/blend-shape deformers, clusters and blend-shape channels.

use crate::node::{Node, NodeTag};
use crate::scene::{BlendShapeChannel, Cluster, Deformer, Document, ObjectInfo};
use crate::util::Mat4;

use super::{definition_slot, set, ObjectBuilder};

impl ObjectBuilder for Deformer {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut deformer = Deformer::new(info);
        for entry in node.properties70() {
            if entry.name() == "Link_DeformAcuracy" {
                set(&mut deformer.link_deform_accuracy, entry.f32());
            }
        }
        set(
            &mut deformer.link_deform_accuracy,
            node.child(NodeTag::LinkDeformAccuracy).and_then(|n| n.f32_at(0)),
        );
        deformer
    }

    definition_slot!(deformers);
}

impl ObjectBuilder for Cluster {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut cluster = Cluster::new(info);
        cluster.indexes = node.child(NodeTag::Indexes).map(Node::i32_array).unwrap_or_default();
        cluster.weights = node.child(NodeTag::Weights).map(Node::f32_array).unwrap_or_default();
        if let Some(m) = node.child(NodeTag::Transform).and_then(matrix) {
            cluster.transform = m;
        }
        if let Some(m) = node.child(NodeTag::TransformLink).and_then(matrix) {
            cluster.transform_link = m;
        }
        cluster
    }
}

/// Column-major 4x4 matrix from a 16-float array node.
fn matrix(node: &Node) -> Option<Mat4> {
    let values = node.f32_array();
    (values.len() >= 16).then(|| Mat4::from_cols_slice(&values[..16]))
}

impl ObjectBuilder for BlendShapeChannel {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let mut channel = BlendShapeChannel::new(info);
        for entry in node.properties70() {
            if entry.name() == "DeformPercent" {
                set(&mut channel.deform_percent, entry.f32());
            }
        }
        set(&mut channel.deform_percent, node.child(NodeTag::DeformPercent).and_then(|n| n.f32_at(0)));
        channel.full_weights = node.child(NodeTag::FullWeights).map(Node::f32_array).unwrap_or_default();
        channel
    }

    definition_slot!(blend_shape_channels);
}
