//! Loosely typed property maps (material properties, user properties).

use crate::node::PropertyEntry;
use crate::util::{Vec2, Vec3, Vec4};

/// A property value typed by its declared FBX type name.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Color(Vec3),
    ColorAlpha(Vec4),
    Float(f32),
    Int(i32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Bool(bool),
}

impl PropertyValue {
    /// Parse the value of a `P` entry by its type name. Unknown types yield `None`.
    pub fn from_entry(entry: &PropertyEntry<'_>) -> Option<Self> {
        match entry.type_name() {
            "KString" => entry.str().map(|s| Self::String(s.to_string())),
            "Color" | "ColorRGB" | "RGBColor" => entry.vec3().map(Self::Color),
            "ColorAndAlpha" => entry.vec4().map(Self::ColorAlpha),
            "Number" | "float" | "double" | "Float" => entry.f32().map(Self::Float),
            "Int" | "int" | "enum" | "Integer" => entry.i32().map(Self::Int),
            "Vector2D" => entry.vec2().map(Self::Vector2),
            "Vector" | "Vector3D" => entry.vec3().map(Self::Vector3),
            "Vector4D" => entry.vec4().map(Self::Vector4),
            "bool" | "Bool" => entry.bool().map(Self::Bool),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(v as f32),
            Self::Bool(b) => Some(b as u8 as f32),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            Self::Color(v) | Self::Vector3(v) => Some(v),
            Self::ColorAlpha(v) | Self::Vector4(v) => Some(v.truncate()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Insertion-ordered name/value map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Copy every entry of `template` this map does not have.
    pub fn inherit_from(&mut self, template: &PropertyMap) {
        for (name, value) in &template.entries {
            if !self.contains(name) {
                self.entries.push((name.clone(), value.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{property_entry, Node};

    #[test]
    fn test_typed_entries() {
        let color = property_entry("DiffuseColor", "Color", "A", [0.5f64.into(), 0.25f64.into(), 1.0f64.into()]);
        let int = property_entry("Count", "enum", "", [3i32.into()]);
        let unknown = property_entry("Blob", "object", "", []);
        let parse = |n: &Node| PropertyValue::from_entry(&PropertyEntry(n));

        assert_eq!(parse(&color), Some(PropertyValue::Color(Vec3::new(0.5, 0.25, 1.0))));
        assert_eq!(parse(&int), Some(PropertyValue::Int(3)));
        assert_eq!(parse(&unknown), None);
    }

    #[test]
    fn test_inherit_keeps_own_values() {
        let mut template = PropertyMap::new();
        template.insert("Shininess", PropertyValue::Float(20.0));
        template.insert("Opacity", PropertyValue::Float(1.0));

        let mut own = PropertyMap::new();
        own.insert("Opacity", PropertyValue::Float(0.5));
        own.inherit_from(&template);

        assert_eq!(own.get("Opacity"), Some(&PropertyValue::Float(0.5)));
        assert_eq!(own.get("Shininess"), Some(&PropertyValue::Float(20.0)));
        assert_eq!(own.len(), 2);
    }
}
