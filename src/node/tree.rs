//! Hierarchical node tree produced by the tokenizer.

use crate::util::{Vec2, Vec3, Vec4};

use super::{NodeTag, Property};

/// One node of the FBX tree: a name, ordered properties and ordered children.
///
/// Built once and read-only afterwards. Same-named siblings are common
/// (several `LayerElementUV` blocks, one `C` per connection), so lookups come
/// in "first" and "all" flavours.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    tag: NodeTag,
    properties: Vec<Property>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let tag = NodeTag::from_name(&name);
        Self { name, tag, properties: Vec::new(), children: Vec::new() }
    }

    /// Builder-style property append.
    pub fn with_property(mut self, value: impl Into<Property>) -> Self {
        self.properties.push(value.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_property(&mut self, value: impl Into<Property>) {
        self.properties.push(value.into());
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tag(&self) -> NodeTag {
        self.tag
    }

    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child with the given tag.
    pub fn child(&self, tag: NodeTag) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in file order.
    pub fn children_with(&self, tag: NodeTag) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First child by exact name, for names outside the interned set.
    pub fn child_named(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    #[inline]
    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    pub fn i64_at(&self, index: usize) -> Option<i64> {
        self.property(index).and_then(Property::as_i64)
    }

    pub fn i32_at(&self, index: usize) -> Option<i32> {
        self.property(index).and_then(Property::as_i32)
    }

    pub fn f64_at(&self, index: usize) -> Option<f64> {
        self.property(index).and_then(Property::as_f64)
    }

    pub fn f32_at(&self, index: usize) -> Option<f32> {
        self.property(index).and_then(Property::as_f32)
    }

    pub fn bool_at(&self, index: usize) -> Option<bool> {
        self.property(index).and_then(Property::as_bool)
    }

    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.property(index).and_then(Property::as_str)
    }

    /// Three consecutive scalars starting at `index`, or an array property at `index`.
    pub fn vec3_at(&self, index: usize) -> Option<Vec3> {
        match self.property(index) {
            Some(p) if p.is_array() => {
                let v = p.to_f32_vec();
                (v.len() >= 3).then(|| Vec3::new(v[0], v[1], v[2]))
            }
            _ => Some(Vec3::new(
                self.f32_at(index)?,
                self.f32_at(index + 1)?,
                self.f32_at(index + 2)?,
            )),
        }
    }

    pub fn vec2_at(&self, index: usize) -> Option<Vec2> {
        Some(Vec2::new(self.f32_at(index)?, self.f32_at(index + 1)?))
    }

    pub fn vec4_at(&self, index: usize) -> Option<Vec4> {
        Some(Vec4::new(
            self.f32_at(index)?,
            self.f32_at(index + 1)?,
            self.f32_at(index + 2)?,
            self.f32_at(index + 3)?,
        ))
    }

    /// Data array of a leaf node such as `Vertices` or `KeyTime`.
    ///
    /// Array nodes carry a single array property; ASCII trees may instead
    /// spell the values as a run of scalar properties.
    pub fn f32_array(&self) -> Vec<f32> {
        self.collect_array(Property::to_f32_vec)
    }

    pub fn f64_array(&self) -> Vec<f64> {
        self.collect_array(Property::to_f64_vec)
    }

    pub fn i32_array(&self) -> Vec<i32> {
        self.collect_array(Property::to_i32_vec)
    }

    pub fn i64_array(&self) -> Vec<i64> {
        self.collect_array(Property::to_i64_vec)
    }

    fn collect_array<T>(&self, convert: impl Fn(&Property) -> Vec<T>) -> Vec<T> {
        match self.properties.as_slice() {
            [single] => convert(single),
            many => many.iter().flat_map(convert).collect(),
        }
    }

    /// Iterate the `P` entries of this node's `Properties70` block.
    pub fn properties70(&self) -> impl Iterator<Item = PropertyEntry<'_>> {
        self.child(NodeTag::Properties70)
            .into_iter()
            .flat_map(|block| block.children_with(NodeTag::Property))
            .map(PropertyEntry)
    }
}

/// A `P` entry: `name, type, label, flags, value...`.
#[derive(Debug, Clone, Copy)]
pub struct PropertyEntry<'a>(pub &'a Node);

impl<'a> PropertyEntry<'a> {
    /// Index of the first value property.
    pub const VALUE: usize = 4;

    pub fn name(&self) -> &'a str {
        self.0.str_at(0).unwrap_or_default()
    }

    /// Name after the last `|`, for compound names like `Maya|baseColor`.
    pub fn short_name(&self) -> &'a str {
        let name = self.name();
        name.rsplit('|').next().unwrap_or(name)
    }

    pub fn type_name(&self) -> &'a str {
        self.0.str_at(1).unwrap_or_default()
    }

    pub fn flags(&self) -> &'a str {
        self.0.str_at(3).unwrap_or_default()
    }

    /// Flagged as a user-defined property (`U` in the flags string).
    pub fn is_user(&self) -> bool {
        self.flags().contains('U')
    }

    pub fn f32(&self) -> Option<f32> {
        self.0.f32_at(Self::VALUE)
    }

    pub fn f64(&self) -> Option<f64> {
        self.0.f64_at(Self::VALUE)
    }

    pub fn i32(&self) -> Option<i32> {
        self.0.i32_at(Self::VALUE)
    }

    pub fn i64(&self) -> Option<i64> {
        self.0.i64_at(Self::VALUE)
    }

    pub fn bool(&self) -> Option<bool> {
        self.0.bool_at(Self::VALUE)
    }

    pub fn str(&self) -> Option<&'a str> {
        self.0.str_at(Self::VALUE)
    }

    pub fn vec2(&self) -> Option<Vec2> {
        self.0.vec2_at(Self::VALUE)
    }

    pub fn vec3(&self) -> Option<Vec3> {
        self.0.vec3_at(Self::VALUE)
    }

    pub fn vec4(&self) -> Option<Vec4> {
        self.0.vec4_at(Self::VALUE)
    }

    /// All numeric values from the value position on.
    pub fn floats(&self) -> Vec<f32> {
        self.0.properties()[Self::VALUE.min(self.0.properties().len())..]
            .iter()
            .flat_map(Property::to_f32_vec)
            .collect()
    }
}

/// Build a `P` entry node. Mostly useful for assembling trees in code.
pub fn property_entry(name: &str, type_name: &str, flags: &str, values: impl IntoIterator<Item = Property>) -> Node {
    let mut node = Node::new("P")
        .with_property(name)
        .with_property(type_name)
        .with_property("")
        .with_property(flags);
    for v in values {
        node.push_property(v);
    }
    node
}

/// Split an object name into `(name, class)`.
///
/// Binary files store `name\0\x01Class`, ASCII files `Class::name`.
pub fn split_object_name(raw: &str, is_binary: bool) -> (&str, &str) {
    if is_binary {
        match raw.find("\u{0}\u{1}") {
            Some(pos) => (&raw[..pos], &raw[pos + 2..]),
            None => (raw, ""),
        }
    } else {
        match raw.find("::") {
            Some(pos) => (&raw[pos + 2..], &raw[..pos]),
            None => (raw, ""),
        }
    }
}
