//! `Model` and `NodeAttribute` objects.

use crate::node::Node;
use crate::scene::{
    AttributeData, Camera, Document, InheritType, Light, MatrixSlot, Model, ModelKind, NodeAttribute, ObjectInfo,
    PropertyValue, RotationOrder,
};

use super::{definition_slot, ObjectBuilder};

impl ObjectBuilder for Model {
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self {
        let kind = match info.class.as_str() {
            "Camera" if doc.options.import_cameras => ModelKind::Camera(Camera::default()),
            "Light" if doc.options.import_lights => ModelKind::Light(Light::default()),
            _ => ModelKind::Plain,
        };
        let mut model = Model::new(info);
        model.kind = kind;

        for entry in node.properties70() {
            let name = entry.name();
            match name {
                "Visibility" => {
                    if let Some(v) = entry.f32() {
                        model.visibility = Some(v);
                        model.matrices.set_field(MatrixSlot::Visibility, 0, v);
                    }
                }
                "Visibility Inheritance" => model.visibility_inheritance = entry.bool(),
                "RotationOrder" => model.rotation_order = entry.i32().map(RotationOrder::from_i32),
                "InheritType" => model.inherit_type = entry.i32().map(InheritType::from_i32),
                _ => {
                    let slot = MatrixSlot::from_property_name(name);
                    if slot != MatrixSlot::Unknown {
                        if let Some(v) = entry.vec3() {
                            model.matrices.set(slot, v);
                        }
                    } else if entry.is_user() {
                        if let Some(value) = PropertyValue::from_entry(&entry) {
                            model.user_properties.insert(name, value);
                        }
                    }
                }
            }
        }
        model
    }

    definition_slot!(models);
}

impl ObjectBuilder for NodeAttribute {
    fn read(node: &Node, info: ObjectInfo, _doc: &Document) -> Self {
        let data = match info.class.as_str() {
            "Camera" => {
                let mut camera = Camera::default();
                camera.read(node);
                AttributeData::Camera(camera)
            }
            "Light" => {
                let mut light = Light::default();
                light.read(node);
                AttributeData::Light(light)
            }
            _ => AttributeData::Other,
        };
        NodeAttribute { info, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::build;
    use crate::core::ImportOptions;
    use crate::node::property_entry;
    use crate::util::Vec3;

    fn model_node(entries: Vec<Node>) -> Node {
        let mut props = Node::new("Properties70");
        for e in entries {
            props = props.with_child(e);
        }
        Node::new("Model").with_child(props)
    }

    #[test]
    fn test_model_properties() {
        let node = model_node(vec![
            property_entry("Lcl Translation", "Lcl Translation", "A", [1.0f64.into(), 2.0f64.into(), 3.0f64.into()]),
            property_entry("Visibility", "Visibility", "A", [0.0f64.into()]),
            property_entry("InheritType", "enum", "", [1i32.into()]),
            property_entry("MyTag", "KString", "U", ["hero".into()]),
            property_entry("NotUser", "KString", "", ["x".into()]),
        ]);
        let doc = Document::new(ImportOptions::default(), false);
        let model = Model::read(&node, ObjectInfo::new(1, "m", "Mesh"), &doc);

        assert_eq!(model.matrices.get(MatrixSlot::LclTranslation, None), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(model.visibility, Some(0.0));
        assert!(model.matrices.is_set(MatrixSlot::Visibility, 0));
        assert_eq!(model.inherit_type, Some(InheritType::RSrs));
        assert_eq!(model.user_properties.get("MyTag"), Some(&PropertyValue::String("hero".into())));
        assert!(!model.user_properties.contains("NotUser"));
    }

    #[test]
    fn test_camera_kind_follows_option() {
        let node = model_node(vec![]);
        let doc = Document::new(ImportOptions::default(), false);
        let model = Model::read(&node, ObjectInfo::new(1, "cam", "Camera"), &doc);
        assert!(model.is_camera());

        let mut options = ImportOptions::default();
        options.import_cameras = false;
        let doc = Document::new(options, false);
        let model = Model::read(&node, ObjectInfo::new(1, "cam", "Camera"), &doc);
        assert!(!model.is_camera());
    }

    #[test]
    fn test_instance_inherits_template_components() {
        let mut doc = Document::new(ImportOptions::default(), false);
        let mut template = Model::new(ObjectInfo::new(crate::scene::TEMPLATE_ID, "Definition", "FbxNode"));
        template.matrices.set(MatrixSlot::LclScaling, Vec3::splat(3.0));
        template.rotation_order = Some(RotationOrder::EulerZyx);
        doc.definitions.models.template = Some(template);

        let node = model_node(vec![property_entry(
            "Lcl Translation",
            "Lcl Translation",
            "A",
            [5.0f64.into(), 0.0f64.into(), 0.0f64.into()],
        )]);
        let handle = build::<Model>(&mut doc, &node, ObjectInfo::new(9, "child", "Null"));
        let model = &doc.models[handle];
        assert_eq!(model.matrices.get(MatrixSlot::LclScaling, None), Vec3::splat(3.0));
        assert_eq!(model.matrices.get(MatrixSlot::LclTranslation, None).x, 5.0);
        assert_eq!(model.rotation_order(), RotationOrder::EulerZyx);
        assert!(model.is_bone);
    }

    #[test]
    fn test_light_attribute() {
        let node = Node::new("NodeAttribute").with_child(
            Node::new("Properties70").with_child(property_entry("Intensity", "Number", "A", [50.0f64.into()])),
        );
        let doc = Document::new(ImportOptions::default(), false);
        let attr = NodeAttribute::read(&node, ObjectInfo::new(4, "lamp", "Light"), &doc);
        match attr.data {
            AttributeData::Light(light) => assert_eq!(light.intensity, 50.0),
            other => panic!("unexpected {other:?}"),
        }
    }
}
