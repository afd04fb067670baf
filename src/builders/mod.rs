//! Per-type object builders and the passes that drive them.
//!
//! Each FBX object class has one [`ObjectBuilder`] that reads a node's
//! `Properties70` block and child nodes into a typed scene object. The same
//! reader builds both real instances (from `Objects`) and definition
//! templates (from `Definitions/ObjectType/PropertyTemplate`):
//!
//! - [`read_header`] - `FBXHeaderExtension`, version check and time code
//! - [`read_global_settings`] - axis, unit and time settings
//! - [`read_definitions`] - templates and declared counts
//! - [`read_objects`] - every object under `Objects`

mod animation;
mod definitions;
mod deformer;
mod geometry;
mod header;
mod model;
mod objects;
mod surface;

pub use definitions::read_definitions;
pub use header::{read_global_settings, read_header};
pub use objects::read_objects;

use tracing::trace;

use crate::node::{split_object_name, Node, NodeTag};
use crate::scene::{Definitions, Document, DocumentObject, ObjectInfo, TEMPLATE_ID};
use crate::util::Handle;

/// Reads one object class from the node tree.
pub(crate) trait ObjectBuilder: DocumentObject {
    /// Build from an object node, or from a `PropertyTemplate` node when
    /// `info` is a template.
    fn read(node: &Node, info: ObjectInfo, doc: &Document) -> Self;

    /// Fill unset fields from the type's definition template.
    fn inherit(&mut self, _definitions: &Definitions) {}

    /// Keep this object as the type's definition template.
    fn store_template(self, _definitions: &mut Definitions) {}
}

/// Implements the template half of [`ObjectBuilder`] for a type with a
/// `TypeDefault` slot in [`Definitions`].
macro_rules! definition_slot {
    ($field:ident) => {
        fn inherit(&mut self, definitions: &$crate::scene::Definitions) {
            definitions.$field.apply(self);
        }

        fn store_template(self, definitions: &mut $crate::scene::Definitions) {
            definitions.$field.template = Some(self);
        }
    };
}

pub(crate) use definition_slot;

/// Identity of an object node: property 0 is the ID, property 1 the
/// combined name, property 2 the class. `None` without a usable ID.
pub(crate) fn object_info(node: &Node, is_binary: bool) -> Option<ObjectInfo> {
    let id = node.i64_at(0)?;
    let raw = node.str_at(1).unwrap_or_default();
    let (name, _) = split_object_name(raw, is_binary);
    let class = node.str_at(2).unwrap_or_default();
    Some(ObjectInfo::new(id, name, class))
}

/// Read a real instance, apply its definition template and register it.
pub(crate) fn build<T: ObjectBuilder>(doc: &mut Document, node: &Node, info: ObjectInfo) -> Handle<T> {
    trace!("building {:?} {} '{}' ({})", T::KIND, info.id, info.name, info.class);
    let mut object = T::read(node, info, doc);
    object.inherit(&doc.definitions);
    doc.add(object)
}

/// Read the `PropertyTemplate` of an `ObjectType` block into the type's
/// definition template. Types without a template block keep none.
pub(crate) fn build_template<T: ObjectBuilder>(doc: &mut Document, object_type: &Node) {
    let Some(template) = object_type.child(NodeTag::PropertyTemplate) else {
        return;
    };
    let class = template.str_at(0).unwrap_or_default();
    let info = ObjectInfo::new(TEMPLATE_ID, "Definition", class);
    T::read(template, info, doc).store_template(&mut doc.definitions);
}

/// Overwrite `field` when `value` is present.
#[inline]
pub(crate) fn set<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

/// First string property of a child node.
pub(crate) fn child_string(node: &Node, tag: NodeTag) -> Option<String> {
    node.child(tag).and_then(|c| c.str_at(0)).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_ascii_and_binary() {
        let ascii = Node::new("Model").with_property(100i64).with_property("Model::Cube").with_property("Mesh");
        let info = object_info(&ascii, false).unwrap();
        assert_eq!(info, ObjectInfo::new(100, "Cube", "Mesh"));

        let binary = Node::new("Model")
            .with_property(7i64)
            .with_property("Hips\u{0}\u{1}Model")
            .with_property("LimbNode");
        assert_eq!(object_info(&binary, true).unwrap(), ObjectInfo::new(7, "Hips", "LimbNode"));
    }

    #[test]
    fn test_object_info_requires_id() {
        let node = Node::new("Model").with_property("Model::Cube");
        assert!(object_info(&node, false).is_none());
    }

    #[test]
    fn test_set_keeps_existing_on_none() {
        let mut field = Some(3);
        set(&mut field, None);
        assert_eq!(field, Some(3));
        set(&mut field, Some(4));
        assert_eq!(field, Some(4));
    }
}
