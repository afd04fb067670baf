//! The document: typed object arenas, the ID table and definition templates.
//!
//! Every object lives in one [`Arena`] per type. Cross references between
//! objects are [`Handle`]s into those arenas, and the file's 64-bit IDs map
//! to handles through a single table, so the graph never holds owning cycles.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use tracing::warn;

use crate::anim::AnimationCurve;
use crate::core::{CoordinateSystem, GlobalSettings, ImportOptions, TimeBase};
use crate::util::{Arena, Handle, Mat4};

use super::{
    AnimationCurveNode, AnimationLayer, AnimationStack, BindingTable, BlendShapeChannel, BlendShapeGeometry,
    Cluster, Deformer, Geometry, Implementation, InheritDefaults, Material, Model, ModelKind, NodeAttribute,
    ObjectRef, SceneObject, Texture, Video,
};

// ============================================================================
// Header
// ============================================================================

/// Facts from `FBXHeaderExtension`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    pub version: u32,
    /// `OtherFlags/TCDefinition` declares the new time code.
    pub new_time_code: bool,
    pub original_application: Option<String>,
    pub last_saved_application: Option<String>,
    /// `YYYY-MM-DD hh:mm:ss.mmm` from `CreationTimeStamp`.
    pub creation_time: Option<String>,
}

// ============================================================================
// Definitions
// ============================================================================

/// Definition template and declared instance count of one object type.
#[derive(Clone, Debug)]
pub struct TypeDefault<T> {
    pub template: Option<T>,
    pub count: usize,
}

impl<T> Default for TypeDefault<T> {
    fn default() -> Self {
        Self { template: None, count: 0 }
    }
}

impl<T: InheritDefaults> TypeDefault<T> {
    /// Fill the unset fields of `object` from the template, if there is one.
    pub fn apply(&self, object: &mut T) {
        if let Some(template) = &self.template {
            object.inherit_from(template);
        }
    }
}

/// Contents of the `Definitions` section, one entry per object type.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    /// Total declared object count.
    pub objects_count: usize,
    pub models: TypeDefault<Model>,
    pub node_attributes: usize,
    pub geometries: TypeDefault<Geometry>,
    pub materials: TypeDefault<Material>,
    pub textures: TypeDefault<Texture>,
    pub layered_textures: usize,
    pub videos: TypeDefault<Video>,
    pub deformers: TypeDefault<Deformer>,
    pub sub_deformers: usize,
    pub blend_shape_channels: TypeDefault<BlendShapeChannel>,
    pub stacks: TypeDefault<AnimationStack>,
    pub layers: TypeDefault<AnimationLayer>,
    pub curve_nodes: TypeDefault<AnimationCurveNode>,
    pub curves: usize,
    pub implementations: TypeDefault<Implementation>,
    pub binding_tables: TypeDefault<BindingTable>,
    pub poses: usize,
}

// ============================================================================
// Typed storage
// ============================================================================

/// Object types stored in a [`Document`] arena.
pub trait DocumentObject: SceneObject + Sized {
    fn arena(doc: &Document) -> &Arena<Self>;
    fn arena_mut(doc: &mut Document) -> &mut Arena<Self>;
    fn object_ref(handle: Handle<Self>) -> ObjectRef;
}

macro_rules! document_object {
    ($($t:ident => $field:ident,)*) => {
        $(impl DocumentObject for $t {
            #[inline]
            fn arena(doc: &Document) -> &Arena<Self> {
                &doc.$field
            }

            #[inline]
            fn arena_mut(doc: &mut Document) -> &mut Arena<Self> {
                &mut doc.$field
            }

            #[inline]
            fn object_ref(handle: Handle<Self>) -> ObjectRef {
                ObjectRef::$t(handle)
            }
        })*
    };
}

document_object! {
    NodeAttribute => node_attributes,
    Model => models,
    Geometry => geometries,
    BlendShapeGeometry => blend_shape_geometries,
    Material => materials,
    Texture => textures,
    Video => videos,
    Deformer => deformers,
    Cluster => clusters,
    BlendShapeChannel => blend_shape_channels,
    AnimationStack => stacks,
    AnimationLayer => layers,
    AnimationCurveNode => curve_nodes,
    AnimationCurve => curves,
    Implementation => implementations,
    BindingTable => binding_tables,
}

// ============================================================================
// Document
// ============================================================================

/// A processed FBX scene.
#[derive(Debug, Default)]
pub struct Document {
    pub header: HeaderInfo,
    pub is_binary: bool,
    pub settings: GlobalSettings,
    pub time_base: TimeBase,
    pub coords: CoordinateSystem,
    pub options: ImportOptions,
    pub definitions: Definitions,

    objects: HashMap<i64, ObjectRef>,

    pub node_attributes: Arena<NodeAttribute>,
    pub models: Arena<Model>,
    pub geometries: Arena<Geometry>,
    pub blend_shape_geometries: Arena<BlendShapeGeometry>,
    pub materials: Arena<Material>,
    pub textures: Arena<Texture>,
    pub videos: Arena<Video>,
    pub deformers: Arena<Deformer>,
    pub clusters: Arena<Cluster>,
    pub blend_shape_channels: Arena<BlendShapeChannel>,
    pub stacks: Arena<AnimationStack>,
    pub layers: Arena<AnimationLayer>,
    pub curve_nodes: Arena<AnimationCurveNode>,
    pub curves: Arena<AnimationCurve>,
    pub implementations: Arena<Implementation>,
    pub binding_tables: Arena<BindingTable>,

    /// Models connected to the document root (destination ID 0).
    pub root_children: Vec<Handle<Model>>,
    pub children_count: usize,
    /// Geometry-to-model connections seen by the counting pass.
    pub connected_geometries_count: usize,
    /// Every warning raised while processing, whether or not it was logged.
    pub warnings: Vec<String>,
}

impl Document {
    pub fn new(options: ImportOptions, is_binary: bool) -> Self {
        let coords = CoordinateSystem::new(&GlobalSettings::default(), &options);
        Self { options, is_binary, coords, ..Default::default() }
    }

    /// Size the ID table and arenas from the declared counts.
    pub fn preallocate(&mut self) {
        let d = &self.definitions;
        self.objects.reserve(d.objects_count);
        self.models.reserve_total(d.models.count);
        self.node_attributes.reserve_total(d.node_attributes);
        self.geometries.reserve_total(d.geometries.count);
        self.materials.reserve_total(d.materials.count);
        self.textures.reserve_total(d.textures.count + d.layered_textures);
        self.videos.reserve_total(d.videos.count);
        self.deformers.reserve_total(d.deformers.count);
        self.clusters.reserve_total(d.sub_deformers.max(d.deformers.count));
        self.stacks.reserve_total(d.stacks.count);
        self.layers.reserve_total(d.layers.count);
        self.curve_nodes.reserve_total(d.curve_nodes.count);
        self.curves.reserve_total(d.curves);
        self.implementations.reserve_total(d.implementations.count);
        self.binding_tables.reserve_total(d.binding_tables.count);
    }

    // ------------------------------------------------------------------------
    // ID table
    // ------------------------------------------------------------------------

    /// Object registered under a file ID.
    #[inline]
    pub fn object(&self, id: i64) -> Option<ObjectRef> {
        self.objects.get(&id).copied()
    }

    #[inline]
    pub fn contains(&self, id: i64) -> bool {
        self.objects.contains_key(&id)
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Store an object and register its ID. An ID seen before keeps its first object.
    pub fn add<T: DocumentObject>(&mut self, object: T) -> Handle<T> {
        let id = object.id();
        let handle = T::arena_mut(self).push(object);
        self.objects.entry(id).or_insert_with(|| T::object_ref(handle));
        handle
    }

    /// Store an object without registering an ID, e.g. a cloned geometry.
    pub fn add_unregistered<T: DocumentObject>(&mut self, object: T) -> Handle<T> {
        T::arena_mut(self).push(object)
    }

    #[inline]
    pub fn get<T: DocumentObject>(&self, handle: Handle<T>) -> Option<&T> {
        T::arena(self).get(handle)
    }

    #[inline]
    pub fn get_mut<T: DocumentObject>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        T::arena_mut(self).get_mut(handle)
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Record a data problem; logged when loading warnings are enabled.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.options.show_loading_warnings {
            warn!("{}", message);
        }
        self.warnings.push(message);
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    #[inline]
    pub fn to_seconds(&self, ticks: i64) -> f32 {
        self.time_base.to_seconds(ticks)
    }

    #[inline]
    pub fn to_ticks(&self, seconds: f64) -> i64 {
        self.time_base.to_ticks(seconds)
    }

    // ------------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------------

    /// Unconverted world matrix of a model: parent chain times local matrix.
    pub fn global_matrix(&self, model: Handle<Model>) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(model);
        // A malformed file could link a model to itself; the walk is bounded
        // by the model count.
        let mut remaining = self.models.len();
        while let (Some(handle), true) = (current, remaining > 0) {
            let Some(m) = self.models.get(handle) else { break };
            matrix = m.local_matrix() * matrix;
            current = m.parent_model();
            remaining -= 1;
        }
        matrix
    }

    /// Converted world matrix of a model, ignoring its own scale: the local
    /// translation and rotation under the converted parent chain.
    pub fn global_matrix_no_scale(&self, model: Handle<Model>) -> Mat4 {
        let Some(m) = self.models.get(model) else {
            return Mat4::IDENTITY;
        };
        let mut matrix = Mat4::from_rotation_translation(m.transform.rotation, m.transform.translation);
        let mut current = m.parent_model();
        let mut remaining = self.models.len();
        while let (Some(handle), true) = (current, remaining > 0) {
            let Some(parent) = self.models.get(handle) else { break };
            matrix = parent.transform.matrix() * matrix;
            current = parent.parent_model();
            remaining -= 1;
        }
        matrix
    }

    /// Depth-first walk over the model tree starting at the root children.
    pub fn walk_models(&self, mut visit: impl FnMut(Handle<Model>, usize)) {
        let mut stack: Vec<(Handle<Model>, usize)> = self.root_children.iter().rev().map(|&h| (h, 0)).collect();
        let mut seen = vec![false; self.models.len()];
        while let Some((handle, depth)) = stack.pop() {
            if std::mem::replace(&mut seen[handle.index()], true) {
                continue;
            }
            visit(handle, depth);
            if let Some(model) = self.models.get(handle) {
                stack.extend(model.children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
    }

    pub fn cameras(&self) -> impl Iterator<Item = (Handle<Model>, &Model)> {
        self.models.iter_handles().filter(|(_, m)| matches!(m.kind, ModelKind::Camera(_)))
    }

    pub fn lights(&self) -> impl Iterator<Item = (Handle<Model>, &Model)> {
        self.models.iter_handles().filter(|(_, m)| matches!(m.kind, ModelKind::Light(_)))
    }

    /// Find a model by name.
    pub fn model_by_name(&self, name: &str) -> Option<Handle<Model>> {
        self.models.iter_handles().find(|(_, m)| m.info.name == name).map(|(h, _)| h)
    }
}

impl<T: DocumentObject> Index<Handle<T>> for Document {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &T::arena(self)[handle]
    }
}

impl<T: DocumentObject> IndexMut<Handle<T>> for Document {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut T::arena_mut(self)[handle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MatrixSlot, ObjectInfo, Parent};
    use crate::util::Vec3;

    #[test]
    fn test_add_registers_first_id_only() {
        let mut doc = Document::default();
        let a = doc.add(Model::new(ObjectInfo::new(100, "a", "Null")));
        let b = doc.add(Model::new(ObjectInfo::new(100, "b", "Null")));
        assert_ne!(a, b);
        assert_eq!(doc.object(100), Some(ObjectRef::Model(a)));
        assert_eq!(doc.object_count(), 1);
        assert_eq!(doc[b].info.name, "b");
    }

    #[test]
    fn test_unregistered_clone() {
        let mut doc = Document::default();
        let g = doc.add(Geometry::new(ObjectInfo::new(200, "mesh", "Mesh")));
        let c = doc.add_unregistered(Geometry::new(ObjectInfo::new(200, "mesh", "Mesh")));
        assert_eq!(doc.object(200), Some(ObjectRef::Geometry(g)));
        assert_eq!(doc.geometries.len(), 2);
        assert!(doc.get(c).is_some());
    }

    #[test]
    fn test_global_matrix_walks_parents() {
        let mut doc = Document::default();
        let mut root = Model::new(ObjectInfo::new(1, "root", "Null"));
        root.matrices.set(MatrixSlot::LclTranslation, Vec3::new(1.0, 0.0, 0.0));
        let root = doc.add(root);
        let mut child = Model::new(ObjectInfo::new(2, "child", "Null"));
        child.matrices.set(MatrixSlot::LclTranslation, Vec3::new(0.0, 2.0, 0.0));
        child.parent = Some(Parent::Model(root));
        let child = doc.add(child);

        let p = doc.global_matrix(child).transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_global_matrix_survives_self_parent() {
        let mut doc = Document::default();
        let h = doc.add(Model::new(ObjectInfo::new(1, "loop", "Null")));
        doc[h].parent = Some(Parent::Model(h));
        assert_eq!(doc.global_matrix(h), Mat4::IDENTITY);
    }

    #[test]
    fn test_warnings_collected() {
        let mut doc = Document::new(ImportOptions::default().with_warnings(false), true);
        doc.warn("Deformer [skin] has no model assigned.");
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_walk_models_depth_first() {
        let mut doc = Document::default();
        let root = doc.add(Model::new(ObjectInfo::new(1, "root", "Null")));
        let a = doc.add(Model::new(ObjectInfo::new(2, "a", "Null")));
        let b = doc.add(Model::new(ObjectInfo::new(3, "b", "Null")));
        doc.root_children.push(root);
        doc[root].children = vec![a, b];

        let mut order = Vec::new();
        doc.walk_models(|h, depth| order.push((doc.models[h].info.name.clone(), depth)));
        assert_eq!(order, vec![("root".into(), 0), ("a".into(), 1), ("b".into(), 1)]);
    }
}
