//! Node-tree builders shared by the integration tests.
#![allow(dead_code)]

use fbx_scene::node::{property_entry, Node, Property};

/// Root node with an `FBXHeaderExtension` of the given version.
pub fn scene(version: i32, sections: Vec<Node>) -> Node {
    let header = Node::new("FBXHeaderExtension").with_child(Node::new("FBXVersion").with_property(version));
    let mut root = Node::new("").with_child(header);
    for section in sections {
        root = root.with_child(section);
    }
    root
}

/// ASCII object node: `Tag: id, "Tag::name", "class"`.
pub fn object(tag: &str, id: i64, name: &str, class: &str) -> Node {
    Node::new(tag)
        .with_property(id)
        .with_property(format!("{}::{}", tag, name))
        .with_property(class)
}

pub fn objects(children: Vec<Node>) -> Node {
    children.into_iter().fold(Node::new("Objects"), Node::with_child)
}

pub fn properties(entries: Vec<Node>) -> Node {
    entries.into_iter().fold(Node::new("Properties70"), Node::with_child)
}

pub fn vec3_entry(name: &str, v: [f64; 3]) -> Node {
    property_entry(name, name, "A", v.map(Property::from))
}

pub fn number_entry(name: &str, value: f64) -> Node {
    property_entry(name, "Number", "A", [value.into()])
}

pub fn int_entry(name: &str, value: i32) -> Node {
    property_entry(name, "int", "", [value.into()])
}

pub fn string_entry(name: &str, value: &str) -> Node {
    property_entry(name, "KString", "", [value.into()])
}

pub fn oo(source: i64, destination: i64) -> Node {
    Node::new("C").with_property("OO").with_property(source).with_property(destination)
}

pub fn op(source: i64, destination: i64, property: &str) -> Node {
    Node::new("C")
        .with_property("OP")
        .with_property(source)
        .with_property(destination)
        .with_property(property)
}

pub fn connections(entries: Vec<Node>) -> Node {
    entries.into_iter().fold(Node::new("Connections"), Node::with_child)
}

/// Single-triangle mesh geometry.
pub fn triangle(id: i64, name: &str) -> Node {
    object("Geometry", id, name, "Mesh")
        .with_child(Node::new("Vertices").with_property(vec![0.0f64, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]))
        .with_child(Node::new("PolygonVertexIndex").with_property(vec![0i32, 1, -3]))
}

/// Layer element with a direct-mapped value array.
pub fn layer_element(tag: &str, mapping: &str, reference: &str, values_tag: &str, values: Property) -> Node {
    Node::new(tag)
        .with_property(0i32)
        .with_child(Node::new("MappingInformationType").with_property(mapping))
        .with_child(Node::new("ReferenceInformationType").with_property(reference))
        .with_child(Node::new(values_tag).with_property(values))
}

/// Animation curve with linear keys at the given tick times.
pub fn curve(id: i64, times: Vec<i64>, values: Vec<f32>) -> Node {
    let count = times.len() as i32;
    object("AnimationCurve", id, "", "")
        .with_child(Node::new("KeyTime").with_property(times))
        .with_child(Node::new("KeyValueFloat").with_property(values))
        .with_child(Node::new("KeyAttrFlags").with_property(vec![0x0000_0004i32]))
        .with_child(Node::new("KeyAttrDataFloat").with_property(vec![0.0f32; 4]))
        .with_child(Node::new("KeyAttrRefCount").with_property(vec![count]))
}
