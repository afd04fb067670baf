//! Document-wide settings and the coordinate conversion derived from them.

use tracing::warn;

use crate::node::Node;
use crate::util::{
    decompose, look_rotation, mirror_rotation, mirror_vector, rot_y, trs, try_inverse, Mat4, Quat, Vec3, Vec4,
};

use super::{ImportOptions, TimeMode};

/// Contents of the `GlobalSettings` block.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalSettings {
    pub unit_scale_factor: f32,
    pub up_axis: i32,
    pub up_axis_sign: i32,
    pub front_axis: i32,
    pub front_axis_sign: i32,
    pub coord_axis: i32,
    pub coord_axis_sign: i32,
    pub original_up_axis: i32,
    pub original_up_axis_sign: i32,
    pub time_mode: TimeMode,
    pub custom_frame_rate: f32,
    pub time_span_start: i64,
    pub time_span_stop: i64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            unit_scale_factor: 1.0,
            up_axis: 1,
            up_axis_sign: 1,
            front_axis: 2,
            front_axis_sign: 1,
            coord_axis: 0,
            coord_axis_sign: 1,
            original_up_axis: -1,
            original_up_axis_sign: 1,
            time_mode: TimeMode::Default,
            custom_frame_rate: -1.0,
            time_span_start: 0,
            time_span_stop: 0,
        }
    }
}

impl GlobalSettings {
    /// Overwrite fields present in the node's `Properties70` block.
    pub fn read(&mut self, node: &Node) {
        for entry in node.properties70() {
            match entry.name() {
                "UnitScaleFactor" => set(&mut self.unit_scale_factor, entry.f32()),
                "UpAxis" => set(&mut self.up_axis, entry.i32()),
                "UpAxisSign" => set(&mut self.up_axis_sign, entry.i32()),
                "FrontAxis" => set(&mut self.front_axis, entry.i32()),
                "FrontAxisSign" => set(&mut self.front_axis_sign, entry.i32()),
                "CoordAxis" => set(&mut self.coord_axis, entry.i32()),
                "CoordAxisSign" => set(&mut self.coord_axis_sign, entry.i32()),
                "OriginalUpAxis" => set(&mut self.original_up_axis, entry.i32()),
                "OriginalUpAxisSign" => set(&mut self.original_up_axis_sign, entry.i32()),
                "TimeMode" => {
                    if let Some(mode) = entry.i32() {
                        self.time_mode = TimeMode::from_i32(mode);
                    }
                }
                "CustomFrameRate" => set(&mut self.custom_frame_rate, entry.f32()),
                "TimeSpanStart" => set(&mut self.time_span_start, entry.i64()),
                "TimeSpanStop" => set(&mut self.time_span_stop, entry.i64()),
                _ => {}
            }
        }
    }

    /// Frames per second of the document.
    pub fn frame_rate(&self) -> f32 {
        let rate = self.time_mode.frame_rate(self.custom_frame_rate);
        if rate > 0.0 {
            rate
        } else {
            30.0
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

/// Conversion from the document's axis convention into the output space
/// (Y up, left handed).
#[derive(Clone, Debug)]
pub struct CoordinateSystem {
    pub is_right_handed: bool,
    pub document_matrix: Mat4,
    pub document_rotation: Quat,
    pub bake: bool,
    pub bake_matrix: Mat4,
    pub bake_rotation: Quat,
    pub bake_rotation_inverse: Quat,
    /// Scale applied to positions: file scale (when enabled) times the user factor.
    pub scale: f32,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new(&GlobalSettings::default(), &ImportOptions::default())
    }
}

impl CoordinateSystem {
    pub fn new(settings: &GlobalSettings, options: &ImportOptions) -> Self {
        let up = axis(settings.up_axis) * settings.up_axis_sign.signum() as f32;
        let front = axis(settings.front_axis) * settings.front_axis_sign.signum() as f32;
        let right = axis(settings.coord_axis) * settings.coord_axis_sign.signum() as f32;

        let basis = Mat4::from_cols(right.extend(0.0), up.extend(0.0), front.extend(0.0), Vec4::W);
        let document_matrix = try_inverse(&basis).unwrap_or_else(|| {
            warn!("degenerate axis settings {:?}/{:?}/{:?}, using identity", up, front, right);
            Mat4::IDENTITY
        });
        let (_, document_rotation, _) = decompose(&document_matrix);
        let is_right_handed = up.cross(front).dot(right) > 0.0;

        let bake = options.bake_axis_conversion;
        let (bake_matrix, bake_rotation) = if bake {
            let flip = if is_right_handed { Mat4::from_quat(rot_y(180.0)) } else { Mat4::IDENTITY };
            let m = flip * document_matrix;
            (m, look_rotation(m.z_axis.truncate(), m.y_axis.truncate()))
        } else {
            (Mat4::IDENTITY, Quat::IDENTITY)
        };

        let mut scale = options.scale_factor;
        if options.use_file_scale {
            scale *= settings.unit_scale_factor / 100.0;
        }

        Self {
            is_right_handed,
            document_matrix,
            document_rotation,
            bake,
            bake_matrix,
            bake_rotation,
            bake_rotation_inverse: bake_rotation.inverse(),
            scale,
        }
    }

    /// Scale and mirror a position (or direction when `apply_scale` is false).
    pub fn convert_vector(&self, v: Vec3, apply_scale: bool) -> Vec3 {
        let v = if apply_scale { v * self.scale } else { v };
        if self.is_right_handed {
            mirror_vector(v)
        } else {
            v
        }
    }

    pub fn convert_rotation(&self, q: Quat) -> Quat {
        if self.is_right_handed {
            mirror_rotation(q)
        } else {
            q
        }
    }

    /// Apply the bake matrix to a point when axis conversion is baked.
    pub fn bake_point(&self, p: Vec3) -> Vec3 {
        if self.bake {
            self.bake_matrix.transform_point3(p)
        } else {
            p
        }
    }

    /// Apply the bake matrix to a direction when axis conversion is baked.
    pub fn bake_direction(&self, d: Vec3) -> Vec3 {
        if self.bake {
            self.bake_matrix.transform_vector3(d)
        } else {
            d
        }
    }

    /// Document orientation for root children, or the bake conversion for everything.
    pub fn apply_orientation(&self, translation: Vec3, rotation: Quat, is_root_child: bool) -> (Vec3, Quat) {
        if self.bake {
            (
                self.bake_matrix.transform_point3(translation),
                self.bake_rotation * rotation * self.bake_rotation_inverse,
            )
        } else if is_root_child {
            (self.document_matrix.transform_point3(translation), self.document_rotation * rotation)
        } else {
            (translation, rotation)
        }
    }

    /// Convert a decomposed local transform into the output space.
    pub fn convert_trs(&self, translation: Vec3, rotation: Quat, scale: Vec3, is_root_child: bool) -> (Vec3, Quat, Vec3) {
        let (t, r) = self.apply_orientation(translation, rotation, is_root_child);
        (self.convert_vector(t, true), self.convert_rotation(r), scale)
    }

    /// Decompose, convert and recompose a local matrix.
    pub fn convert_matrix(&self, m: &Mat4, is_root_child: bool) -> Mat4 {
        let (t, r, s) = decompose(m);
        let (t, r, s) = self.convert_trs(t, r, s, is_root_child);
        trs(t, r, s)
    }
}

fn axis(index: i32) -> Vec3 {
    match index {
        0 => Vec3::X,
        1 => Vec3::Y,
        2 => Vec3::Z,
        other => {
            warn!("invalid axis index {}, using X", other);
            Vec3::X
        }
    }
}
