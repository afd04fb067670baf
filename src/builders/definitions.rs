//! `Definitions` section: per-type templates and declared counts.

use tracing::debug;

use crate::node::{Node, NodeTag};
use crate::scene::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BindingTable, BlendShapeChannel, Deformer, Document,
    Geometry, Implementation, Material, Model, Texture, Video,
};

use super::build_template;

/// Read every `ObjectType` block. Types switched off by the import options
/// keep neither a template nor a count.
///
/// A type declaring no count (or zero) is counted from the `Objects` section
/// instead, so preallocation still sees a size.
pub fn read_definitions(doc: &mut Document, root: &Node) {
    let Some(definitions) = root.child(NodeTag::Definitions) else {
        return;
    };
    doc.definitions.objects_count = definitions
        .child(NodeTag::Count)
        .and_then(|c| c.i64_at(0))
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or(1);

    let objects = root.child(NodeTag::Objects);
    let animation = doc.options.imports_animation();
    let options = doc.options.clone();

    for object_type in definitions.children_with(NodeTag::ObjectType) {
        let type_name = object_type.str_at(0).unwrap_or_default();
        let declared = object_type
            .child(NodeTag::Count)
            .and_then(|c| c.i64_at(0))
            .and_then(|c| usize::try_from(c).ok())
            .unwrap_or(0);
        let count = |tags: &[NodeTag]| {
            if declared > 0 {
                declared
            } else {
                objects.map_or(0, |o| o.children().iter().filter(|c| tags.contains(&c.tag())).count())
            }
        };

        match type_name {
            "Model" => {
                build_template::<Model>(doc, object_type);
                doc.definitions.models.count = count(&[NodeTag::Model]);
            }
            "NodeAttribute" => doc.definitions.node_attributes = count(&[NodeTag::NodeAttribute]),
            "Material" if options.import_materials => {
                build_template::<Material>(doc, object_type);
                doc.definitions.materials.count = count(&[NodeTag::Material]);
            }
            "Texture" if options.import_textures => {
                build_template::<Texture>(doc, object_type);
                doc.definitions.textures.count = count(&[NodeTag::Texture]);
            }
            "LayeredTexture" if options.import_textures => {
                doc.definitions.layered_textures = count(&[NodeTag::LayeredTexture]);
            }
            "Video" if options.import_textures => {
                build_template::<Video>(doc, object_type);
                doc.definitions.videos.count = count(&[NodeTag::Video]);
            }
            "Geometry" if options.import_meshes => {
                build_template::<Geometry>(doc, object_type);
                doc.definitions.geometries.count = count(&[NodeTag::Geometry]);
            }
            "AnimationStack" | "AnimStack" if animation => {
                build_template::<AnimationStack>(doc, object_type);
                doc.definitions.stacks.count = count(&[NodeTag::AnimationStack, NodeTag::AnimStack]);
            }
            "AnimationLayer" | "AnimLayer" if animation => {
                build_template::<AnimationLayer>(doc, object_type);
                doc.definitions.layers.count = count(&[NodeTag::AnimationLayer, NodeTag::AnimLayer]);
            }
            "AnimationCurveNode" | "AnimCurveNode" if animation => {
                build_template::<AnimationCurveNode>(doc, object_type);
                doc.definitions.curve_nodes.count = count(&[NodeTag::AnimationCurveNode, NodeTag::AnimCurveNode]);
            }
            "AnimationCurve" | "AnimCurve" if animation => {
                doc.definitions.curves = count(&[NodeTag::AnimationCurve, NodeTag::AnimCurve]);
            }
            "Deformer" if animation || options.import_blend_shapes => {
                build_template::<Deformer>(doc, object_type);
                doc.definitions.deformers.count = count(&[NodeTag::Deformer]);
            }
            "SubDeformer" if animation || options.import_blend_shapes => {
                build_template::<BlendShapeChannel>(doc, object_type);
                doc.definitions.sub_deformers = count(&[NodeTag::SubDeformer]);
            }
            "Implementation" => {
                build_template::<Implementation>(doc, object_type);
                doc.definitions.implementations.count = count(&[NodeTag::Implementation]);
            }
            "BindingTable" => {
                build_template::<BindingTable>(doc, object_type);
                doc.definitions.binding_tables.count = count(&[NodeTag::BindingTable]);
            }
            "Pose" => doc.definitions.poses = count(&[NodeTag::Pose]),
            _ => {}
        }
    }

    debug!(
        "definitions: {} objects, {} models, {} geometries, {} curves",
        doc.definitions.objects_count,
        doc.definitions.models.count,
        doc.definitions.geometries.count,
        doc.definitions.curves
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnimationType, ImportOptions};
    use crate::node::property_entry;

    fn object_type(name: &str, count: Option<i32>, template: Option<Node>) -> Node {
        let mut node = Node::new("ObjectType").with_property(name);
        if let Some(count) = count {
            node = node.with_child(Node::new("Count").with_property(count));
        }
        if let Some(template) = template {
            node = node.with_child(template);
        }
        node
    }

    fn model_template() -> Node {
        Node::new("PropertyTemplate").with_property("FbxNode").with_child(
            Node::new("Properties70")
                .with_child(property_entry("Lcl Scaling", "Lcl Scaling", "A", [2.0f64.into(), 2.0f64.into(), 2.0f64.into()]))
                .with_child(property_entry("RotationOrder", "enum", "", [3i32.into()])),
        )
    }

    #[test]
    fn test_templates_and_counts() {
        let definitions = Node::new("Definitions")
            .with_child(Node::new("Count").with_property(12i32))
            .with_child(object_type("Model", Some(3), Some(model_template())))
            .with_child(object_type("AnimationCurve", Some(9), None));
        let root = Node::new("").with_child(definitions);
        let mut doc = Document::new(ImportOptions::default(), false);

        read_definitions(&mut doc, &root);
        let d = &doc.definitions;
        assert_eq!(d.objects_count, 12);
        assert_eq!(d.models.count, 3);
        assert_eq!(d.curves, 9);
        let template = d.models.template.as_ref().unwrap();
        assert!(template.info.is_template());
        assert_eq!(template.info.class, "FbxNode");
        assert_eq!(template.rotation_order, Some(crate::scene::RotationOrder::EulerYxz));
        assert_eq!(template.matrices.get(crate::scene::MatrixSlot::LclScaling, None), crate::util::Vec3::splat(2.0));
    }

    #[test]
    fn test_missing_count_falls_back_to_objects() {
        let definitions = Node::new("Definitions").with_child(object_type("Geometry", None, None));
        let objects = Node::new("Objects")
            .with_child(Node::new("Geometry").with_property(1i64))
            .with_child(Node::new("Geometry").with_property(2i64))
            .with_child(Node::new("Model").with_property(3i64));
        let root = Node::new("").with_child(definitions).with_child(objects);
        let mut doc = Document::new(ImportOptions::default(), false);

        read_definitions(&mut doc, &root);
        assert_eq!(doc.definitions.geometries.count, 2);
        assert_eq!(doc.definitions.objects_count, 1);
    }

    #[test]
    fn test_disabled_types_are_skipped() {
        let definitions = Node::new("Definitions")
            .with_child(object_type("AnimationStack", Some(2), None))
            .with_child(object_type("AnimationCurve", Some(5), None));
        let root = Node::new("").with_child(definitions);
        let options = ImportOptions::default().with_animation_type(AnimationType::None);
        let mut doc = Document::new(options, false);

        read_definitions(&mut doc, &root);
        assert_eq!(doc.definitions.stacks.count, 0);
        assert_eq!(doc.definitions.curves, 0);
    }
}
