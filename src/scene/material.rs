//! Surface materials.

use crate::util::{Handle, Vec3};

use super::object::scene_object;
use super::{Implementation, InheritDefaults, ObjectInfo, PropertyMap, PropertyValue, Texture};

/// Property a texture connected straight to a model is bound to.
pub const DIFFUSE_TEXTURE: &str = "DiffuseColorTex";

#[derive(Clone, Debug, Default)]
pub struct Material {
    pub info: ObjectInfo,
    /// Position in the document's material arena; `-1` for templates.
    pub index: i32,
    pub properties: PropertyMap,
    /// Texture bindings keyed by `<property>Tex`; first binding wins.
    pub textures: Vec<(String, Handle<Texture>)>,
    pub multi_layer: Option<i32>,
    pub shading_model: Option<String>,
    pub implementation: Option<Handle<Implementation>>,
}

scene_object!(Material, Material);

impl Material {
    pub fn new(info: ObjectInfo, index: i32) -> Self {
        Self { info, index, ..Default::default() }
    }

    pub fn texture(&self, property: &str) -> Option<Handle<Texture>> {
        self.textures.iter().find(|(name, _)| name == property).map(|&(_, h)| h)
    }

    #[inline]
    pub fn has_texture(&self, property: &str) -> bool {
        self.texture(property).is_some()
    }

    /// Bind a texture unless the property already has one. Returns whether it was bound.
    pub fn bind_texture(&mut self, property: impl Into<String>, texture: Handle<Texture>) -> bool {
        let property = property.into();
        if self.has_texture(&property) {
            return false;
        }
        self.textures.push((property, texture));
        true
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.properties.get(name).and_then(PropertyValue::as_f32)
    }

    pub fn color(&self, name: &str) -> Option<Vec3> {
        self.properties.get(name).and_then(PropertyValue::as_vec3)
    }

    /// Phong and Lambert materials use the classic diffuse/specular setup.
    pub fn is_phong(&self) -> bool {
        self.shading_model
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("phong") || m.eq_ignore_ascii_case("lambert"))
    }
}

impl InheritDefaults for Material {
    fn inherit_from(&mut self, template: &Self) {
        self.properties.inherit_from(&template.properties);
        self.multi_layer = self.multi_layer.or(template.multi_layer);
        if self.shading_model.is_none() {
            self.shading_model.clone_from(&template.shading_model);
        }
    }
}
