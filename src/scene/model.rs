//! Transform nodes and their per-slot transform components.
//!
//! A [`Model`] stores its transform as fourteen named vector slots
//! ([`MatrixSlot`]) in a [`Matrices`] block. Each x/y/z component is tracked
//! separately, so a missing component falls back on its own: instance, then
//! type definition, then the slot's hard default.

use crate::util::{euler_xyz, quat_is_valid, rot_x, rot_y, rot_z, trs, Handle, Mat4, Quat, Vec3};

use super::object::scene_object;
use super::{Geometry, InheritDefaults, Material, ObjectInfo, PropertyMap, Texture};
use super::{Camera, Light};

// ============================================================================
// Matrix slots
// ============================================================================

/// Named transform component of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MatrixSlot {
    LclTranslation = 0,
    RotationOffset = 1,
    RotationPivot = 2,
    PreRotation = 3,
    LclRotation = 4,
    PostRotation = 5,
    ScalingOffset = 6,
    ScalingPivot = 7,
    LclScaling = 8,
    GeometricTranslation = 9,
    GeometricRotation = 10,
    GeometricScaling = 11,
    Visibility = 12,
    Unknown = 13,
}

/// Number of slots, including [`MatrixSlot::Unknown`].
pub const SLOT_COUNT: usize = 14;

impl MatrixSlot {
    pub const ALL: [MatrixSlot; SLOT_COUNT] = [
        MatrixSlot::LclTranslation,
        MatrixSlot::RotationOffset,
        MatrixSlot::RotationPivot,
        MatrixSlot::PreRotation,
        MatrixSlot::LclRotation,
        MatrixSlot::PostRotation,
        MatrixSlot::ScalingOffset,
        MatrixSlot::ScalingPivot,
        MatrixSlot::LclScaling,
        MatrixSlot::GeometricTranslation,
        MatrixSlot::GeometricRotation,
        MatrixSlot::GeometricScaling,
        MatrixSlot::Visibility,
        MatrixSlot::Unknown,
    ];

    /// Slot driven by a model property name (curve node OP connections).
    pub fn from_property_name(name: &str) -> Self {
        match name {
            "Lcl Translation" => Self::LclTranslation,
            "RotationOffset" => Self::RotationOffset,
            "RotationPivot" => Self::RotationPivot,
            "PreRotation" => Self::PreRotation,
            "Lcl Rotation" => Self::LclRotation,
            "PostRotation" => Self::PostRotation,
            "ScalingOffset" => Self::ScalingOffset,
            "ScalingPivot" => Self::ScalingPivot,
            "Lcl Scaling" => Self::LclScaling,
            "GeometricTranslation" => Self::GeometricTranslation,
            "GeometricRotation" => Self::GeometricRotation,
            "GeometricScaling" => Self::GeometricScaling,
            "Visibility" => Self::Visibility,
            _ => Self::Unknown,
        }
    }

    /// Hard default when neither instance nor definition sets the slot.
    pub fn default_value(self) -> Vec3 {
        match self {
            Self::LclScaling | Self::GeometricScaling => Vec3::ONE,
            _ => Vec3::ZERO,
        }
    }

    /// Slots evaluated with continuous interpolation when resampling.
    #[inline]
    pub fn is_resampled(self) -> bool {
        matches!(self, Self::LclTranslation | Self::LclRotation | Self::LclScaling)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Matrices
// ============================================================================

const ALL_FIELDS: u8 = 0b111;

/// Per-slot vector values with per-component presence flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrices {
    values: [Vec3; SLOT_COUNT],
    present: [u8; SLOT_COUNT],
}

impl Default for Matrices {
    fn default() -> Self {
        let mut values = [Vec3::ZERO; SLOT_COUNT];
        for slot in MatrixSlot::ALL {
            values[slot.index()] = slot.default_value();
        }
        Self { values, present: [0; SLOT_COUNT] }
    }
}

impl Matrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all three components of a slot.
    pub fn set(&mut self, slot: MatrixSlot, value: Vec3) {
        self.values[slot.index()] = value;
        self.present[slot.index()] = ALL_FIELDS;
    }

    /// Set one component (0 = x, 1 = y, 2 = z). Other indices are ignored.
    pub fn set_field(&mut self, slot: MatrixSlot, field: usize, value: f32) {
        if field < 3 {
            self.values[slot.index()][field] = value;
            self.present[slot.index()] |= 1 << field;
        }
    }

    #[inline]
    pub fn is_set(&self, slot: MatrixSlot, field: usize) -> bool {
        field < 3 && self.present[slot.index()] & (1 << field) != 0
    }

    /// True when any component of the slot is set.
    #[inline]
    pub fn has_slot(&self, slot: MatrixSlot) -> bool {
        self.present[slot.index()] != 0
    }

    /// Reset every slot to its default and clear all flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Effective value of one component: own value, else `fallback`'s
    /// effective value, else the slot default.
    pub fn field(&self, slot: MatrixSlot, field: usize, fallback: Option<&Matrices>) -> f32 {
        if self.is_set(slot, field) {
            self.values[slot.index()][field]
        } else if let Some(fb) = fallback {
            fb.field(slot, field, None)
        } else {
            slot.default_value()[field]
        }
    }

    /// Effective value of a slot, resolved per component.
    pub fn get(&self, slot: MatrixSlot, fallback: Option<&Matrices>) -> Vec3 {
        Vec3::new(
            self.field(slot, 0, fallback),
            self.field(slot, 1, fallback),
            self.field(slot, 2, fallback),
        )
    }

    /// Copy each component the template sets and `self` does not.
    pub fn inherit_from(&mut self, template: &Matrices) {
        for slot in MatrixSlot::ALL {
            for field in 0..3 {
                if !self.is_set(slot, field) && template.is_set(slot, field) {
                    self.set_field(slot, field, template.values[slot.index()][field]);
                }
            }
        }
    }

    /// Local transform:
    /// `T * Roff * Rp * Rpre * R * Rpost^-1 * Rp^-1 * Soff * Sp * S * Sp^-1`.
    pub fn local_matrix(&self, fallback: Option<&Matrices>, order: RotationOrder) -> Mat4 {
        let get = |slot| self.get(slot, fallback);
        let translation = Mat4::from_translation(get(MatrixSlot::LclTranslation));
        let rotation_offset = Mat4::from_translation(get(MatrixSlot::RotationOffset));
        let rotation_pivot = get(MatrixSlot::RotationPivot);
        let pre_rotation = Mat4::from_quat(euler_xyz(get(MatrixSlot::PreRotation)));
        let rotation = Mat4::from_quat(order.quat(get(MatrixSlot::LclRotation)).unwrap_or(Quat::IDENTITY));
        let post_rotation_inv = Mat4::from_quat(euler_xyz(get(MatrixSlot::PostRotation)).inverse());
        let scaling_offset = Mat4::from_translation(get(MatrixSlot::ScalingOffset));
        let scaling_pivot = get(MatrixSlot::ScalingPivot);
        let scaling = Mat4::from_scale(get(MatrixSlot::LclScaling));

        translation
            * rotation_offset
            * Mat4::from_translation(rotation_pivot)
            * pre_rotation
            * rotation
            * post_rotation_inv
            * Mat4::from_translation(-rotation_pivot)
            * scaling_offset
            * Mat4::from_translation(scaling_pivot)
            * scaling
            * Mat4::from_translation(-scaling_pivot)
    }

    /// Geometric transform `T * R(XYZ) * S`, applied to the model's own mesh only.
    pub fn geometric_matrix(&self) -> Mat4 {
        trs(
            self.get(MatrixSlot::GeometricTranslation, None),
            euler_xyz(self.get(MatrixSlot::GeometricRotation, None)),
            self.get(MatrixSlot::GeometricScaling, None),
        )
    }

    /// Two models can share one mesh only when their geometric transforms match.
    pub fn is_geometry_compatible(&self, other: &Matrices) -> bool {
        [
            MatrixSlot::GeometricTranslation,
            MatrixSlot::GeometricRotation,
            MatrixSlot::GeometricScaling,
        ]
        .into_iter()
        .all(|slot| self.get(slot, None) == other.get(slot, None))
    }
}

// ============================================================================
// Rotation order / inheritance
// ============================================================================

/// Euler rotation order of `Lcl Rotation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotationOrder {
    #[default]
    EulerXyz,
    EulerXzy,
    EulerYzx,
    EulerYxz,
    EulerZxy,
    EulerZyx,
    SphericXyz,
}

impl RotationOrder {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::EulerXzy,
            2 => Self::EulerYzx,
            3 => Self::EulerYxz,
            4 => Self::EulerZxy,
            5 => Self::EulerZyx,
            6 => Self::SphericXyz,
            _ => Self::EulerXyz,
        }
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::SphericXyz)
    }

    /// Rotation from Euler degrees, `None` for unsupported orders.
    /// Non-finite results collapse to identity.
    pub fn quat(self, degrees: Vec3) -> Option<Quat> {
        let rx = rot_x(degrees.x);
        let ry = rot_y(degrees.y);
        let rz = rot_z(degrees.z);
        let q = match self {
            Self::EulerXyz => rz * ry * rx,
            Self::EulerXzy => ry * rz * rx,
            Self::EulerYzx => rx * rz * ry,
            Self::EulerYxz => rz * rx * ry,
            Self::EulerZxy => ry * rx * rz,
            Self::EulerZyx => rx * ry * rz,
            Self::SphericXyz => return None,
        };
        Some(if quat_is_valid(q) { q } else { Quat::IDENTITY })
    }
}

/// How a child inherits its parent's rotation and scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InheritType {
    #[default]
    RrSs,
    RSrs,
    Rrs,
}

impl InheritType {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::RSrs,
            2 => Self::Rrs,
            _ => Self::RrSs,
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// Parent of a model. Root-level models hang off the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
    Document,
    Model(Handle<Model>),
}

/// Specialization of a model.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ModelKind {
    #[default]
    Plain,
    Camera(Camera),
    Light(Light),
}

/// Converted local transform, filled by model post-processing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl LocalTransform {
    pub fn matrix(&self) -> Mat4 {
        trs(self.translation, self.rotation, self.scale)
    }
}

/// Transform node.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub info: ObjectInfo,
    pub rotation_order: Option<RotationOrder>,
    pub inherit_type: Option<InheritType>,
    pub visibility: Option<f32>,
    pub visibility_inheritance: Option<bool>,
    pub matrices: Matrices,
    pub user_properties: PropertyMap,
    pub kind: ModelKind,
    /// `LimbNode` and `Null` models may act as skeleton bones.
    pub is_bone: bool,

    pub parent: Option<Parent>,
    pub children: Vec<Handle<Model>>,
    pub children_count: usize,
    pub mesh: Option<Handle<Geometry>>,
    pub connected_geometries_count: usize,
    /// Connected materials, in connection order; polygon material indices point here.
    pub materials: Vec<Handle<Material>>,
    pub materials_count: usize,
    pub diffuse_texture: Option<Handle<Texture>>,
    pub bones: Vec<Handle<Model>>,
    pub bind_poses: Vec<Mat4>,
    pub bones_count: usize,

    pub transform: LocalTransform,
    /// World-space rotation pivot, set by the pivot pass.
    pub pivot: Vec3,
    pub has_custom_pivot: bool,
    /// Converted world matrix without the model's own scale, captured with the pivot.
    pub original_global_matrix: Mat4,
}

scene_object!(Model, Model);

impl Model {
    pub fn new(info: ObjectInfo) -> Self {
        let is_bone = matches!(info.class.as_str(), "LimbNode" | "Null");
        Self { info, is_bone, ..Default::default() }
    }

    #[inline]
    pub fn rotation_order(&self) -> RotationOrder {
        self.rotation_order.unwrap_or_default()
    }

    #[inline]
    pub fn inherit_type(&self) -> InheritType {
        self.inherit_type.unwrap_or_default()
    }

    /// Visible unless the file says otherwise.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visibility.map_or(true, |v| v > 0.0)
    }

    #[inline]
    pub fn is_camera(&self) -> bool {
        matches!(self.kind, ModelKind::Camera(_))
    }

    #[inline]
    pub fn is_light(&self) -> bool {
        matches!(self.kind, ModelKind::Light(_))
    }

    /// Cameras without a look-at target and lights take an extra half turn
    /// about Y after conversion.
    pub fn faces_backward(&self) -> bool {
        match &self.kind {
            ModelKind::Camera(camera) => camera.look_at.is_none(),
            ModelKind::Light(_) => true,
            ModelKind::Plain => false,
        }
    }

    #[inline]
    pub fn is_root_child(&self) -> bool {
        self.parent == Some(Parent::Document)
    }

    pub fn parent_model(&self) -> Option<Handle<Model>> {
        match self.parent {
            Some(Parent::Model(h)) => Some(h),
            _ => None,
        }
    }

    /// Unconverted local matrix in file space.
    pub fn local_matrix(&self) -> Mat4 {
        self.matrices.local_matrix(None, self.rotation_order())
    }

    pub fn geometric_matrix(&self) -> Mat4 {
        self.matrices.geometric_matrix()
    }

    /// Attach a child, keeping the preallocated capacity from the counting pass.
    pub(crate) fn push_child(&mut self, child: Handle<Model>) {
        if self.children.capacity() < self.children_count {
            self.children.reserve_exact(self.children_count - self.children.len());
        }
        self.children.push(child);
    }
}

impl InheritDefaults for Model {
    fn inherit_from(&mut self, template: &Self) {
        self.rotation_order = self.rotation_order.or(template.rotation_order);
        self.inherit_type = self.inherit_type.or(template.inherit_type);
        self.visibility = self.visibility.or(template.visibility);
        self.visibility_inheritance = self.visibility_inheritance.or(template.visibility_inheritance);
        self.matrices.inherit_from(&template.matrices);
        self.user_properties.inherit_from(&template.user_properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_slot_defaults() {
        let m = Matrices::new();
        assert_eq!(m.get(MatrixSlot::LclScaling, None), Vec3::ONE);
        assert_eq!(m.get(MatrixSlot::GeometricScaling, None), Vec3::ONE);
        assert_eq!(m.get(MatrixSlot::LclTranslation, None), Vec3::ZERO);
        assert!(!m.has_slot(MatrixSlot::LclTranslation));
    }

    #[test]
    fn test_per_component_fallback() {
        let mut template = Matrices::new();
        template.set(MatrixSlot::LclTranslation, Vec3::new(1.0, 2.0, 3.0));

        let mut own = Matrices::new();
        own.set_field(MatrixSlot::LclTranslation, 1, 9.0);

        assert_eq!(own.get(MatrixSlot::LclTranslation, Some(&template)), Vec3::new(1.0, 9.0, 3.0));
        assert_eq!(own.get(MatrixSlot::LclTranslation, None), Vec3::new(0.0, 9.0, 0.0));
    }

    #[test]
    fn test_inherit_only_fills_gaps() {
        let mut template = Matrices::new();
        template.set(MatrixSlot::LclRotation, Vec3::splat(45.0));

        let mut own = Matrices::new();
        own.set(MatrixSlot::LclScaling, Vec3::splat(2.0));
        own.inherit_from(&template);

        assert_eq!(own.get(MatrixSlot::LclRotation, None), Vec3::splat(45.0));
        assert_eq!(own.get(MatrixSlot::LclScaling, None), Vec3::splat(2.0));
        assert_eq!(own.get(MatrixSlot::LclTranslation, None), Vec3::ZERO);
        assert!(!own.has_slot(MatrixSlot::LclTranslation));
    }

    #[test]
    fn test_rotation_orders_differ() {
        let deg = Vec3::new(30.0, 60.0, 90.0);
        let xyz = RotationOrder::EulerXyz.quat(deg).unwrap();
        let zyx = RotationOrder::EulerZyx.quat(deg).unwrap();
        assert!(!xyz.abs_diff_eq(zyx, 1e-4));
        assert!(RotationOrder::SphericXyz.quat(deg).is_none());
        assert_eq!(RotationOrder::from_i32(5), RotationOrder::EulerZyx);
    }

    #[test]
    fn test_rotation_pivot() {
        // 90 degrees about Z around pivot (1,0,0): the origin lands on (1,-1,0).
        let mut m = Matrices::new();
        m.set(MatrixSlot::LclRotation, Vec3::new(0.0, 0.0, 90.0));
        m.set(MatrixSlot::RotationPivot, Vec3::new(1.0, 0.0, 0.0));
        let p = m.local_matrix(None, RotationOrder::EulerXyz).transform_point3(Vec3::ZERO);
        assert!(approx(p, Vec3::new(1.0, -1.0, 0.0)));
    }

    #[test]
    fn test_pre_post_rotation_cancel() {
        let mut m = Matrices::new();
        m.set(MatrixSlot::PreRotation, Vec3::new(0.0, 90.0, 0.0));
        m.set(MatrixSlot::PostRotation, Vec3::new(0.0, 90.0, 0.0));
        let v = m.local_matrix(None, RotationOrder::EulerXyz).transform_vector3(Vec3::X);
        assert!(approx(v, Vec3::X));
    }

    #[test]
    fn test_geometry_compatibility() {
        let a = Matrices::new();
        let mut b = Matrices::new();
        assert!(a.is_geometry_compatible(&b));
        b.set(MatrixSlot::GeometricScaling, Vec3::new(-1.0, 1.0, 1.0));
        assert!(!a.is_geometry_compatible(&b));
        assert!(b.geometric_matrix().determinant() < 0.0);
    }

    #[test]
    fn test_model_class_flags() {
        let bone = Model::new(ObjectInfo::new(1, "Hips", "LimbNode"));
        let mesh = Model::new(ObjectInfo::new(2, "Body", "Mesh"));
        assert!(bone.is_bone);
        assert!(!mesh.is_bone);
        assert!(mesh.is_visible());
    }
}
