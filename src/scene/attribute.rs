//! Node attributes: camera and light parameters attached to models.

use crate::node::Node;
use crate::util::{Handle, Vec3};

use super::object::scene_object;
use super::{Model, ObjectInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Camera parameters. Angles in degrees, lengths in file units.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    pub field_of_view: f32,
    pub field_of_view_x: f32,
    pub field_of_view_y: f32,
    pub focal_length: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub aspect_width: f32,
    pub aspect_height: f32,
    pub film_width: f32,
    pub film_height: f32,
    pub ortho_zoom: f32,
    pub roll: f32,
    pub position: Vec3,
    pub up_vector: Vec3,
    pub interest_position: Vec3,
    pub background_color: Vec3,
    /// Target model from a `LookAtProperty` connection.
    pub look_at: Option<Handle<Model>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            field_of_view: 40.0,
            field_of_view_x: 40.0,
            field_of_view_y: 40.0,
            focal_length: 34.89,
            near_plane: 10.0,
            far_plane: 4000.0,
            aspect_width: 320.0,
            aspect_height: 200.0,
            film_width: 0.816,
            film_height: 0.612,
            ortho_zoom: 1.0,
            roll: 0.0,
            position: Vec3::ZERO,
            up_vector: Vec3::Y,
            interest_position: Vec3::ZERO,
            background_color: Vec3::ZERO,
            look_at: None,
        }
    }
}

impl Camera {
    /// Override fields present in the node's property block.
    pub fn read(&mut self, node: &Node) {
        for entry in node.properties70() {
            match entry.name() {
                "CameraProjectionType" => {
                    if let Some(p) = entry.i32() {
                        self.projection = if p == 1 { Projection::Orthographic } else { Projection::Perspective };
                    }
                }
                "FieldOfView" => set(&mut self.field_of_view, entry.f32()),
                "FieldOfViewX" => set(&mut self.field_of_view_x, entry.f32()),
                "FieldOfViewY" => set(&mut self.field_of_view_y, entry.f32()),
                "FocalLength" => set(&mut self.focal_length, entry.f32()),
                "NearPlane" => set(&mut self.near_plane, entry.f32()),
                "FarPlane" => set(&mut self.far_plane, entry.f32()),
                "AspectWidth" => set(&mut self.aspect_width, entry.f32()),
                "AspectHeight" => set(&mut self.aspect_height, entry.f32()),
                "FilmWidth" => set(&mut self.film_width, entry.f32()),
                "FilmHeight" => set(&mut self.film_height, entry.f32()),
                "OrthoZoom" => set(&mut self.ortho_zoom, entry.f32()),
                "Roll" => set(&mut self.roll, entry.f32()),
                "Position" => set(&mut self.position, entry.vec3()),
                "UpVector" => set(&mut self.up_vector, entry.vec3()),
                "InterestPosition" => set(&mut self.interest_position, entry.vec3()),
                "BackgroundColor" => set(&mut self.background_color, entry.vec3()),
                _ => {}
            }
        }
    }

    /// Aspect ratio, 1 when the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.aspect_height != 0.0 {
            self.aspect_width / self.aspect_height
        } else {
            1.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LightType {
    #[default]
    Point,
    Directional,
    Spot,
    Area,
    Volume,
}

impl LightType {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Directional,
            2 => Self::Spot,
            3 => Self::Area,
            4 => Self::Volume,
            _ => Self::Point,
        }
    }
}

/// Light parameters. Intensity is the file's percentage value.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub color: Vec3,
    pub intensity: f32,
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub cast_shadows: bool,
    pub area_light_shape: i32,
    pub far_attenuation_end: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec3::ONE,
            intensity: 100.0,
            inner_angle: 0.0,
            outer_angle: 45.0,
            cast_shadows: false,
            area_light_shape: 0,
            far_attenuation_end: 0.0,
        }
    }
}

impl Light {
    pub fn read(&mut self, node: &Node) {
        for entry in node.properties70() {
            match entry.name() {
                "LightType" => {
                    if let Some(t) = entry.i32() {
                        self.light_type = LightType::from_i32(t);
                    }
                }
                "Color" => set(&mut self.color, entry.vec3()),
                "Intensity" => set(&mut self.intensity, entry.f32()),
                "InnerAngle" => set(&mut self.inner_angle, entry.f32()),
                "OuterAngle" => set(&mut self.outer_angle, entry.f32()),
                "CastShadows" => set(&mut self.cast_shadows, entry.bool()),
                "AreaLightShape" => set(&mut self.area_light_shape, entry.i32()),
                "FarAttenuationEnd" => set(&mut self.far_attenuation_end, entry.f32()),
                _ => {}
            }
        }
    }
}

/// Parameters carried by a `NodeAttribute` object.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeData {
    Camera(Camera),
    Light(Light),
    #[default]
    Other,
}

/// `NodeAttribute` object, applied to its model in the counting pass.
#[derive(Clone, Debug, Default)]
pub struct NodeAttribute {
    pub info: ObjectInfo,
    pub data: AttributeData,
}

scene_object!(NodeAttribute, NodeAttribute);

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::property_entry;

    #[test]
    fn test_camera_read_overrides_only_present() {
        let node = Node::new("NodeAttribute").with_child(
            Node::new("Properties70")
                .with_child(property_entry("FieldOfView", "FieldOfView", "A", [60.0f64.into()]))
                .with_child(property_entry("CameraProjectionType", "enum", "", [1i32.into()])),
        );
        let mut cam = Camera::default();
        cam.read(&node);
        assert_eq!(cam.field_of_view, 60.0);
        assert_eq!(cam.projection, Projection::Orthographic);
        assert_eq!(cam.near_plane, Camera::default().near_plane);
    }

    #[test]
    fn test_light_type() {
        let node = Node::new("NodeAttribute").with_child(
            Node::new("Properties70").with_child(property_entry("LightType", "enum", "", [2i32.into()])),
        );
        let mut light = Light::default();
        light.read(&node);
        assert_eq!(light.light_type, LightType::Spot);
    }
}
