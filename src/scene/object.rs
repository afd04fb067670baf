//! Identity shared by every scene object and the typed reference used by the ID table.

use crate::anim::AnimationCurve;
use crate::util::Handle;

use super::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BindingTable, BlendShapeChannel, BlendShapeGeometry,
    Cluster, Deformer, Geometry, Implementation, Material, Model, NodeAttribute, Texture, Video,
};

/// ID used by definition templates.
pub const TEMPLATE_ID: i64 = -1;

/// Name, file ID and class string of an object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    pub id: i64,
    pub name: String,
    /// Disambiguates objects of one type, e.g. `LimbNode` vs `Null` models.
    pub class: String,
}

impl ObjectInfo {
    pub fn new(id: i64, name: impl Into<String>, class: impl Into<String>) -> Self {
        Self { id, name: name.into(), class: class.into() }
    }

    /// Definition templates carry [`TEMPLATE_ID`].
    #[inline]
    pub fn is_template(&self) -> bool {
        self.id == TEMPLATE_ID
    }
}

/// Capabilities every scene object has: identity, class and a dispatch tag.
pub trait SceneObject {
    const KIND: ObjectKind;

    fn info(&self) -> &ObjectInfo;

    #[inline]
    fn id(&self) -> i64 {
        self.info().id
    }

    #[inline]
    fn name(&self) -> &str {
        &self.info().name
    }

    #[inline]
    fn class(&self) -> &str {
        &self.info().class
    }
}

/// Objects that take per-field defaults from their type's definition template.
pub trait InheritDefaults {
    /// Fill every field not set on `self` from `template`.
    fn inherit_from(&mut self, template: &Self);
}

/// Dispatch tag of a scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    NodeAttribute,
    Model,
    Geometry,
    BlendShapeGeometry,
    Material,
    Texture,
    Video,
    Deformer,
    Cluster,
    BlendShapeChannel,
    AnimationStack,
    AnimationLayer,
    AnimationCurveNode,
    AnimationCurve,
    Implementation,
    BindingTable,
}

/// Typed handle stored in the document's ID table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectRef {
    NodeAttribute(Handle<NodeAttribute>),
    Model(Handle<Model>),
    Geometry(Handle<Geometry>),
    BlendShapeGeometry(Handle<BlendShapeGeometry>),
    Material(Handle<Material>),
    Texture(Handle<Texture>),
    Video(Handle<Video>),
    Deformer(Handle<Deformer>),
    Cluster(Handle<Cluster>),
    BlendShapeChannel(Handle<BlendShapeChannel>),
    AnimationStack(Handle<AnimationStack>),
    AnimationLayer(Handle<AnimationLayer>),
    AnimationCurveNode(Handle<AnimationCurveNode>),
    AnimationCurve(Handle<AnimationCurve>),
    Implementation(Handle<Implementation>),
    BindingTable(Handle<BindingTable>),
}

impl ObjectRef {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::NodeAttribute(_) => ObjectKind::NodeAttribute,
            ObjectRef::Model(_) => ObjectKind::Model,
            ObjectRef::Geometry(_) => ObjectKind::Geometry,
            ObjectRef::BlendShapeGeometry(_) => ObjectKind::BlendShapeGeometry,
            ObjectRef::Material(_) => ObjectKind::Material,
            ObjectRef::Texture(_) => ObjectKind::Texture,
            ObjectRef::Video(_) => ObjectKind::Video,
            ObjectRef::Deformer(_) => ObjectKind::Deformer,
            ObjectRef::Cluster(_) => ObjectKind::Cluster,
            ObjectRef::BlendShapeChannel(_) => ObjectKind::BlendShapeChannel,
            ObjectRef::AnimationStack(_) => ObjectKind::AnimationStack,
            ObjectRef::AnimationLayer(_) => ObjectKind::AnimationLayer,
            ObjectRef::AnimationCurveNode(_) => ObjectKind::AnimationCurveNode,
            ObjectRef::AnimationCurve(_) => ObjectKind::AnimationCurve,
            ObjectRef::Implementation(_) => ObjectKind::Implementation,
            ObjectRef::BindingTable(_) => ObjectKind::BindingTable,
        }
    }
}

/// Implement [`SceneObject`] for a struct with an `info: ObjectInfo` field.
macro_rules! scene_object {
    ($t:ty, $kind:ident) => {
        impl $crate::scene::SceneObject for $t {
            const KIND: $crate::scene::ObjectKind = $crate::scene::ObjectKind::$kind;

            #[inline]
            fn info(&self) -> &$crate::scene::ObjectInfo {
                &self.info
            }
        }
    };
}

pub(crate) use scene_object;
