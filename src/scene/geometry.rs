//! Mesh geometry and blend-shape target geometry.

use smallvec::SmallVec;

use crate::geom::{LayerAccessor, MeshBuffers};
use crate::util::{Handle, Vec3, Vec4};

use super::object::scene_object;
use super::{BlendShapeChannel, Deformer, InheritDefaults, Model, ObjectInfo};

/// Number of UV channels a geometry can carry.
pub const UV_CHANNELS: usize = 4;

/// Per-corner data sources of a mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryLayers {
    pub positions: Option<LayerAccessor>,
    pub normals: Option<LayerAccessor>,
    pub tangents: Option<LayerAccessor>,
    pub colors: Option<LayerAccessor>,
    pub uvs: [Option<LayerAccessor>; UV_CHANNELS],
    pub materials: Option<LayerAccessor>,
}

impl GeometryLayers {
    /// Number of UV channels present, counting gaps.
    pub fn uv_channel_count(&self) -> usize {
        self.uvs.iter().rposition(Option::is_some).map_or(0, |i| i + 1)
    }
}

/// One skin influence on a control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneWeight {
    /// Index into the owning model's `bones`.
    pub bone: usize,
    pub weight: f32,
}

pub type BoneWeights = SmallVec<[BoneWeight; 4]>;

/// Polygon mesh.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub info: ObjectInfo,
    pub layers: GeometryLayers,
    /// Flat polygon stream; a complemented index closes a polygon.
    pub polygon_vertex_index: Vec<i32>,

    pub color: Option<Vec4>,
    pub bbox_min: Option<Vec3>,
    pub bbox_max: Option<Vec3>,
    pub primary_visibility: Option<bool>,
    pub cast_shadows: Option<bool>,
    pub receive_shadows: Option<bool>,

    pub model: Option<Handle<Model>>,
    /// Geometry this one was cloned from when two models with different
    /// geometric transforms share a mesh.
    pub base: Option<Handle<Geometry>>,
    pub deformers: Vec<Handle<Deformer>>,
    pub blend_shape_bindings_count: usize,
    pub has_skin: bool,
    pub has_blend_shapes: bool,

    /// Skin influences per control point, filled by deformer post-processing.
    pub bone_weights: Vec<BoneWeights>,
    /// Blend-shape channels bound to this geometry, in post-processing order.
    pub blend_shapes: Vec<Handle<BlendShapeChannel>>,
    /// Triangulated output.
    pub mesh: Option<MeshBuffers>,
}

scene_object!(Geometry, Geometry);

impl Geometry {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    /// Number of control points.
    pub fn vertex_count(&self) -> usize {
        self.layers.positions.as_ref().map_or(0, |p| p.len())
    }

    /// Polygon count of the index stream.
    pub fn polygon_count(&self) -> usize {
        self.polygon_vertex_index.iter().filter(|&&i| i < 0).count()
    }

    /// Copy of the shared data for a second model; links are not copied.
    pub fn clone_for(&self, base: Handle<Geometry>, model: Handle<Model>) -> Self {
        Self {
            info: self.info.clone(),
            layers: self.layers.clone(),
            polygon_vertex_index: self.polygon_vertex_index.clone(),
            color: self.color,
            bbox_min: self.bbox_min,
            bbox_max: self.bbox_max,
            primary_visibility: self.primary_visibility,
            cast_shadows: self.cast_shadows,
            receive_shadows: self.receive_shadows,
            model: Some(model),
            base: Some(base),
            blend_shape_bindings_count: self.blend_shape_bindings_count,
            has_blend_shapes: self.has_blend_shapes,
            ..Default::default()
        }
    }

    /// Record a skin influence. The per-point table is sized to the control
    /// points; an influence on a point past the end is dropped and reported
    /// as `false`.
    pub fn add_bone_weight(&mut self, vertex: usize, weight: BoneWeight) -> bool {
        let count = self.vertex_count();
        if vertex >= count {
            return false;
        }
        if self.bone_weights.len() < count {
            self.bone_weights.resize_with(count, BoneWeights::new);
        }
        self.bone_weights[vertex].push(weight);
        true
    }
}

impl InheritDefaults for Geometry {
    fn inherit_from(&mut self, template: &Self) {
        self.color = self.color.or(template.color);
        self.bbox_min = self.bbox_min.or(template.bbox_min);
        self.bbox_max = self.bbox_max.or(template.bbox_max);
        self.primary_visibility = self.primary_visibility.or(template.primary_visibility);
        self.cast_shadows = self.cast_shadows.or(template.cast_shadows);
        self.receive_shadows = self.receive_shadows.or(template.receive_shadows);
    }
}

/// Sparse blend-shape target (`Geometry` of class `Shape`).
#[derive(Clone, Debug, Default)]
pub struct BlendShapeGeometry {
    pub info: ObjectInfo,
    /// Control point affected by each entry of `vertices`.
    pub indexes: Vec<i32>,
    pub vertices: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    /// Full weight of the frame, set by post-processing.
    pub frame_weight: f32,
    pub processed: bool,
}

scene_object!(BlendShapeGeometry, BlendShapeGeometry);

impl BlendShapeGeometry {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    /// Position in `vertices` of a control point, if the shape moves it.
    pub fn shape_index(&self, control_point: i32) -> Option<usize> {
        self.indexes.iter().position(|&i| i == control_point)
    }
}
