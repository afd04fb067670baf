//! Behavioural properties of the import pipeline, driven through `process`.

mod common;

use common::*;
use fbx_scene::anim::{hermite, pack_weights, solve_tangents, AnimationCurve, CurveCursor, KeyFlags};
use fbx_scene::core::{TimeBase, TICKS_PER_SECOND_LEGACY, TICKS_PER_SECOND_NEW};
use fbx_scene::node::{Node, Property};
use fbx_scene::scene::{MatrixSlot, ObjectInfo, ObjectRef, Parent};
use fbx_scene::util::Vec3;
use fbx_scene::{process, Document, ImportOptions};

fn import(root: &Node) -> Document {
    process(root, false, &ImportOptions::default()).unwrap()
}

fn model_id(doc: &Document, id: i64) -> fbx_scene::util::Handle<fbx_scene::scene::Model> {
    match doc.object(id) {
        Some(ObjectRef::Model(handle)) => handle,
        other => panic!("object {} is not a model: {:?}", id, other),
    }
}

#[test]
fn test_template_inheritance_is_per_field() {
    let definitions = Node::new("Definitions").with_child(
        Node::new("ObjectType")
            .with_property("Model")
            .with_child(Node::new("Count").with_property(1i32))
            .with_child(
                Node::new("PropertyTemplate")
                    .with_property("FbxNode")
                    .with_child(properties(vec![vec3_entry("Lcl Rotation", [0.0, 45.0, 0.0])])),
            ),
    );
    let cube = object("Model", 1, "Cube", "Mesh").with_child(properties(vec![vec3_entry("Lcl Scaling", [2.0, 2.0, 2.0])]));
    let root = scene(7500, vec![definitions, objects(vec![cube]), connections(vec![oo(1, 0)])]);
    let doc = import(&root);

    let model = &doc.models[doc.model_by_name("Cube").unwrap()];
    assert_eq!(model.matrices.get(MatrixSlot::LclTranslation, None), Vec3::ZERO);
    assert_eq!(model.matrices.get(MatrixSlot::LclRotation, None), Vec3::new(0.0, 45.0, 0.0));
    assert_eq!(model.matrices.get(MatrixSlot::LclScaling, None), Vec3::splat(2.0));
    assert!(!model.matrices.has_slot(MatrixSlot::LclTranslation));
}

#[test]
fn test_children_match_counting_pass() {
    let models = (1..=4).map(|id| object("Model", id, &format!("m{}", id), "Null")).collect();
    let root = scene(
        7500,
        vec![objects(models), connections(vec![oo(1, 0), oo(2, 1), oo(3, 1), oo(4, 1)])],
    );
    let doc = import(&root);

    let parent = model_id(&doc, 1);
    let model = &doc.models[parent];
    assert_eq!(model.children_count, 3);
    assert_eq!(model.children, vec![model_id(&doc, 2), model_id(&doc, 3), model_id(&doc, 4)]);
    assert_eq!(doc.root_children, vec![parent]);
    for id in 2..=4 {
        assert_eq!(doc.models[model_id(&doc, id)].parent, Some(Parent::Model(parent)));
    }
}

#[test]
fn test_auto_tangents_are_continuous() {
    let second = TICKS_PER_SECOND_LEGACY;
    let mut curve = AnimationCurve::new(ObjectInfo::new(1, "c", ""));
    curve.key_times = vec![0, second, 3 * second, 4 * second];
    curve.key_values = vec![0.0, 2.0, 3.0, -1.0];
    curve.key_attr_flags = vec![(KeyFlags::INTERPOLATION_CUBIC | KeyFlags::TANGENT_AUTO).bits() as i32];
    curve.key_attr_data = vec![0.0, 0.0, pack_weights(0.333333, 0.333333), 0.0];
    curve.key_attr_ref_count = vec![4];

    let tangents = solve_tangents(&curve, TimeBase::default());
    assert_eq!(tangents.len(), 4);
    for key in &tangents[1..3] {
        assert_eq!(key.slope_left, key.slope_right);
    }
    // (3 - 0) / (3 - 0)
    assert!((tangents[1].slope_left - 1.0).abs() < 1e-5);
}

#[test]
fn test_hermite_hits_endpoints() {
    for &(p0, p1, m0, m1) in &[(0.0f32, 1.0f32, 0.0f32, 0.0f32), (-3.5, 7.25, 12.0, -4.0), (2.0, 2.0, 100.0, 100.0)] {
        assert_eq!(hermite(p0, p1, m0, m1, 0.0), p0);
        assert_eq!(hermite(p0, p1, m0, m1, 1.0), p1);
    }

    let mut curve = AnimationCurve::new(ObjectInfo::new(1, "c", ""));
    curve.key_times = vec![0, TICKS_PER_SECOND_LEGACY];
    curve.key_values = vec![4.0, -2.0];
    curve.key_attr_flags = vec![(KeyFlags::INTERPOLATION_CUBIC | KeyFlags::TANGENT_AUTO).bits() as i32];
    curve.key_attr_data = vec![0.0; 4];
    curve.key_attr_ref_count = vec![2];
    curve.initialize(TimeBase::default());

    let mut cursor = CurveCursor::new();
    assert_eq!(cursor.evaluate(&curve, 0, TimeBase::default()), 4.0);
    assert_eq!(cursor.evaluate(&curve, TICKS_PER_SECOND_LEGACY, TimeBase::default()), -2.0);
}

/// Whether the emitted corner order is an even permutation of the source order.
fn winding_parity(doc: &Document) -> bool {
    let mesh = doc.geometries.iter().find_map(|g| g.mesh.as_ref()).unwrap();
    let order: Vec<u32> = mesh.vertices.iter().map(|v| v.control_point).collect();
    assert_eq!(order.len(), 3);
    matches!(order.as_slice(), [0, 1, 2] | [1, 2, 0] | [2, 0, 1])
}

fn winding_scene(front_axis_sign: i32, geometric_scaling: Option<[f64; 3]>) -> Node {
    let settings = Node::new("GlobalSettings").with_child(properties(vec![int_entry("FrontAxisSign", front_axis_sign)]));
    let mut entries = Vec::new();
    if let Some(scale) = geometric_scaling {
        entries.push(vec3_entry("GeometricScaling", scale));
    }
    let model = object("Model", 1, "tri", "Mesh").with_child(properties(entries));
    scene(
        7500,
        vec![settings, objects(vec![model, triangle(2, "tri")]), connections(vec![oo(1, 0), oo(2, 1)])],
    )
}

#[test]
fn test_winding_flips_with_handedness_and_mirroring() {
    let right = import(&winding_scene(1, None));
    let left = import(&winding_scene(-1, None));
    assert!(right.coords.is_right_handed);
    assert!(!left.coords.is_right_handed);
    assert_ne!(winding_parity(&right), winding_parity(&left));

    let mirrored = import(&winding_scene(1, Some([-1.0, 1.0, 1.0])));
    assert_eq!(winding_parity(&mirrored), winding_parity(&left));
}

#[test]
fn test_time_round_trip() {
    for base in [TimeBase::new(7500, false), TimeBase::new(7700, true)] {
        for seconds in [0.0f64, 1.0 / 30.0, 1.5, 12.25] {
            let back = base.to_seconds(base.to_ticks(seconds));
            assert!((f64::from(back) - seconds).abs() < 1e-5, "{} -> {}", seconds, back);
        }
    }

    let header = |tc: i32| {
        Node::new("FBXHeaderExtension")
            .with_child(Node::new("FBXVersion").with_property(7700i32))
            .with_child(Node::new("OtherFlags").with_child(Node::new("TCDefinition").with_property(tc)))
    };
    let new = import(&Node::new("").with_child(header(0)));
    assert_eq!(new.time_base.ticks_per_second(), TICKS_PER_SECOND_NEW);
    let legacy = import(&Node::new("").with_child(header(127)));
    assert_eq!(legacy.time_base.ticks_per_second(), TICKS_PER_SECOND_LEGACY);
    assert_eq!(import(&scene(7500, vec![])).time_base.ticks_per_second(), TICKS_PER_SECOND_LEGACY);
}

#[test]
fn test_hierarchy_and_mesh_ids() {
    let root = scene(
        7500,
        vec![
            objects(vec![object("Model", 100, "root", "Null"), object("Model", 101, "body", "Mesh"), triangle(200, "body")]),
            connections(vec![oo(100, 0), oo(101, 100), oo(200, 101)]),
        ],
    );
    let doc = import(&root);

    let models: Vec<_> = doc.models.handles().collect();
    assert_eq!(models.len(), 2);
    assert_eq!(doc.models[models[1]].parent, Some(Parent::Model(models[0])));
    assert_eq!(doc.models[models[0]].parent, Some(Parent::Document));
    let mesh = doc.models[models[1]].mesh.unwrap();
    assert_eq!(doc.geometries[mesh].info.id, 200);
    assert_eq!(doc.geometries[mesh].model, Some(models[1]));
}

#[test]
fn test_override_passthrough_layers_fold_in_id_order() {
    let layer = |id: i64, weight: f64, layer_id: i32| {
        object("AnimationLayer", id, &format!("layer{}", layer_id), "").with_child(properties(vec![
            number_entry("Weight", weight),
            property_entry_enum("BlendMode", 2),
            int_entry("mLayerID", layer_id),
        ]))
    };
    let curve_node = |id: i64| {
        object("AnimationCurveNode", id, "T", "").with_child(properties(vec![
            number_entry("d|X", 0.0),
            number_entry("d|Y", 0.0),
            number_entry("d|Z", 0.0),
        ]))
    };
    // The second layer is listed first; mLayerID decides the order.
    let root = scene(
        7500,
        vec![
            objects(vec![
                object("Model", 1, "rig", "Null"),
                object("Model", 2, "bone", "Null"),
                object("AnimationStack", 10, "Take", ""),
                layer(21, 50.0, 1),
                layer(20, 100.0, 0),
                curve_node(30),
                curve_node(31),
                curve(40, vec![0], vec![10.0]),
                curve(41, vec![0], vec![20.0]),
            ]),
            connections(vec![
                oo(1, 0),
                oo(2, 1),
                oo(20, 10),
                oo(21, 10),
                oo(30, 20),
                oo(31, 21),
                op(30, 2, "Lcl Translation"),
                op(31, 2, "Lcl Translation"),
                op(40, 30, "d|Y"),
                op(41, 31, "d|Y"),
            ]),
        ],
    );
    let options = ImportOptions::default().with_file_scale(false);
    let doc = process(&root, false, &options).unwrap();

    let stack = doc.stacks.iter().next().unwrap();
    let animation = stack.output.as_ref().unwrap();
    let binding = &animation.bindings[0];
    assert_eq!(binding.model, doc.model_by_name("bone").unwrap());
    let y = binding.curve("localPosition.y").unwrap();
    assert_eq!(y.keys.len(), 1);
    // lerp(lerp(0, 10, 1.0), 20, 0.5)
    assert!((y.keys[0].value - 15.0).abs() < 1e-4);
    assert!(binding.curve("localRotation.w").is_none());
}

fn property_entry_enum(name: &str, value: i32) -> Node {
    fbx_scene::node::property_entry(name, "enum", "", [Property::from(value)])
}

#[test]
fn test_out_of_range_uv_index_is_clamped() {
    let uvs = Node::new("LayerElementUV")
        .with_property(0i32)
        .with_child(Node::new("MappingInformationType").with_property("ByPolygonVertex"))
        .with_child(Node::new("ReferenceInformationType").with_property("IndexToDirect"))
        .with_child(Node::new("UV").with_property(vec![0.0f64, 0.0, 0.5, 0.5]))
        .with_child(Node::new("UVIndex").with_property(vec![0i32, 9, 1]));
    let geometry = triangle(2, "tri").with_child(uvs);
    let root = scene(
        7500,
        vec![objects(vec![object("Model", 1, "tri", "Mesh"), geometry]), connections(vec![oo(1, 0), oo(2, 1)])],
    );
    let doc = import(&root);

    let mesh = doc.geometries.iter().find_map(|g| g.mesh.as_ref()).unwrap();
    let corner = mesh.vertices.iter().find(|v| v.control_point == 1).unwrap();
    assert_eq!(corner.uv[0], [0.5, 0.5]);
    let first = mesh.vertices.iter().find(|v| v.control_point == 0).unwrap();
    assert_eq!(first.uv[0], [0.0, 0.0]);
}
