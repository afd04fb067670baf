//! Math type re-exports and FBX-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the small set of
//! transform helpers the importer relies on: Euler composition in degrees,
//! right-to-left handed mirroring and TRS decomposition.

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec3A, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Integer vectors
    IVec2, IVec3, IVec4,
    // Single precision matrices
    Mat3, Mat4,
    // Double precision matrices
    DMat4,
    // Quaternions
    Quat, DQuat,
};

// ============================================================================
// Rotations
// ============================================================================

/// Rotation about a single axis, angle in degrees.
#[inline]
pub fn rot_x(degrees: f32) -> Quat {
    Quat::from_rotation_x(degrees.to_radians())
}

/// Rotation about a single axis, angle in degrees.
#[inline]
pub fn rot_y(degrees: f32) -> Quat {
    Quat::from_rotation_y(degrees.to_radians())
}

/// Rotation about a single axis, angle in degrees.
#[inline]
pub fn rot_z(degrees: f32) -> Quat {
    Quat::from_rotation_z(degrees.to_radians())
}

/// Euler rotation in degrees applied X first, then Y, then Z.
///
/// Used for pre/post rotations and geometric rotations, which are always XYZ
/// regardless of the node's rotation order.
#[inline]
pub fn euler_xyz(degrees: Vec3) -> Quat {
    rot_z(degrees.z) * rot_y(degrees.y) * rot_x(degrees.x)
}

/// True when every component is finite.
#[inline]
pub fn quat_is_valid(q: Quat) -> bool {
    q.is_finite() && q.length_squared() > f32::EPSILON
}

/// Rotation with +Z along `forward` and +Y as close to `up` as possible.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or_zero();
    if f == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let r = up.cross(f).normalize_or_zero();
    if r == Vec3::ZERO {
        return Quat::from_rotation_arc(Vec3::Z, f);
    }
    let u = f.cross(r);
    Quat::from_mat3(&Mat3::from_cols(r, u, f)).normalize()
}

// ============================================================================
// Handedness
// ============================================================================

/// Mirror a right-handed vector into the left-handed output space (negate X).
#[inline]
pub fn mirror_vector(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// Mirror a right-handed rotation into the left-handed output space.
#[inline]
pub fn mirror_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

// ============================================================================
// Matrices
// ============================================================================

/// Compose translation, rotation and scale.
#[inline]
pub fn trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Decompose into (translation, rotation, scale). Invalid rotations become identity.
pub fn decompose(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let (scale, rotation, translation) = m.to_scale_rotation_translation();
    let rotation = if quat_is_valid(rotation) {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    };
    (translation, rotation, scale)
}

/// Inverse of `m`, or `None` when the determinant is (nearly) zero.
pub fn try_inverse(m: &Mat4) -> Option<Mat4> {
    let det = m.determinant();
    if det.abs() <= f32::EPSILON * 1e-3 || !det.is_finite() {
        None
    } else {
        Some(m.inverse())
    }
}
