//! The `Objects` section: one builder call per object node.

use tracing::{debug, trace};

use crate::anim::AnimationCurve;
use crate::node::{Node, NodeTag};
use crate::scene::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BindingTable, BlendShapeChannel, BlendShapeGeometry, Cluster,
    Deformer, Document, Geometry, Implementation, Material, Model, NodeAttribute, Texture, Video,
};

use super::{build, object_info};

/// Build every object under `Objects`, dispatching on the node tag.
///
/// Objects of disabled import categories are skipped, as are nodes without
/// an ID and IDs already registered.
pub fn read_objects(doc: &mut Document, root: &Node) {
    let Some(objects) = root.child(NodeTag::Objects) else {
        return;
    };
    let animation = doc.options.imports_animation();
    let options = doc.options.clone();
    let mut skipped = 0usize;

    for node in objects.children() {
        let Some(info) = object_info(node, doc.is_binary) else {
            continue;
        };
        if doc.contains(info.id) {
            trace!("duplicate object ID {}", info.id);
            continue;
        }

        match node.tag() {
            NodeTag::NodeAttribute => {
                build::<NodeAttribute>(doc, node, info);
            }
            NodeTag::Model => {
                build::<Model>(doc, node, info);
            }
            NodeTag::Material if options.import_materials => {
                build::<Material>(doc, node, info);
            }
            NodeTag::Video if options.import_textures => {
                build::<Video>(doc, node, info);
            }
            NodeTag::Texture | NodeTag::LayeredTexture if options.import_textures => {
                build::<Texture>(doc, node, info);
            }
            NodeTag::Geometry if options.import_meshes => {
                if info.class == "Shape" {
                    if options.import_blend_shapes {
                        build::<BlendShapeGeometry>(doc, node, info);
                    }
                } else {
                    build::<Geometry>(doc, node, info);
                }
            }
            NodeTag::AnimationStack | NodeTag::AnimStack if animation => {
                build::<AnimationStack>(doc, node, info);
            }
            NodeTag::AnimationLayer | NodeTag::AnimLayer if animation => {
                build::<AnimationLayer>(doc, node, info);
            }
            NodeTag::AnimationCurveNode | NodeTag::AnimCurveNode if animation => {
                build::<AnimationCurveNode>(doc, node, info);
            }
            NodeTag::AnimationCurve | NodeTag::AnimCurve if animation => {
                build::<AnimationCurve>(doc, node, info);
            }
            NodeTag::Deformer | NodeTag::SubDeformer if animation || options.import_blend_shapes => {
                match info.class.as_str() {
                    "Cluster" => {
                        build::<Cluster>(doc, node, info);
                    }
                    "BlendShapeChannel" => {
                        build::<BlendShapeChannel>(doc, node, info);
                    }
                    _ if node.tag() == NodeTag::Deformer => {
                        build::<Deformer>(doc, node, info);
                    }
                    _ => skipped += 1,
                }
            }
            NodeTag::Implementation => {
                build::<Implementation>(doc, node, info);
            }
            NodeTag::BindingTable => {
                build::<BindingTable>(doc, node, info);
            }
            _ => skipped += 1,
        }
    }
    debug!("objects: {} registered, {} skipped", doc.object_count(), skipped);
}
