//! Scene object model.
//!
//! The [`Document`] owns every object in typed arenas; objects refer to each
//! other through [`Handle`](crate::util::Handle)s. Object types:
//!
//! - [`Model`] - transform node, optionally a camera or light
//! - [`NodeAttribute`] - camera/light parameters applied to a model
//! - [`Geometry`] / [`BlendShapeGeometry`] - meshes and blend-shape targets
//! - [`Material`], [`Texture`], [`Video`] - surfaces and media
//! - [`Deformer`], [`Cluster`], [`BlendShapeChannel`] - skinning and morphing
//! - [`AnimationStack`], [`AnimationLayer`], [`AnimationCurveNode`] - animation grouping
//! - [`Implementation`], [`BindingTable`] - shader bindings

mod animation;
mod attribute;
mod deformer;
mod document;
mod geometry;
mod implementation;
mod material;
mod model;
mod object;
mod properties;
mod texture;

pub use animation::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BlendMode, CurveBinding, RotationAccumulation,
    ScaleAccumulation,
};
pub use attribute::{AttributeData, Camera, Light, LightType, NodeAttribute, Projection};
pub use deformer::{BlendShapeChannel, Cluster, Deformer};
pub use document::{Definitions, Document, DocumentObject, HeaderInfo, TypeDefault};
pub use geometry::{BlendShapeGeometry, BoneWeight, BoneWeights, Geometry, GeometryLayers, UV_CHANNELS};
pub use implementation::{BindingTable, Implementation};
pub use material::{Material, DIFFUSE_TEXTURE};
pub use model::{
    InheritType, LocalTransform, Matrices, MatrixSlot, Model, ModelKind, Parent, RotationOrder, SLOT_COUNT,
};
pub use object::{InheritDefaults, ObjectInfo, ObjectKind, ObjectRef, SceneObject, TEMPLATE_ID};
pub use properties::{PropertyMap, PropertyValue};
pub use texture::{Texture, TextureLayers, Video, VideoContent, WrapMode};

pub(crate) use object::scene_object;
