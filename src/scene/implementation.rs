//! Shader implementations attached to materials.

use crate::util::Handle;

use super::object::scene_object;
use super::{InheritDefaults, ObjectInfo};

/// Entry type marking the source column as the material property.
const PROPERTY_ENTRY: &str = "FbxPropertyEntry";
/// Entry type marking the target column as the shader semantic.
const SEMANTIC_ENTRY: &str = "FbxSemanticEntry";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Implementation {
    pub info: ObjectInfo,
    pub shader_language: Option<String>,
    pub shader_language_version: Option<i32>,
    pub render_api: Option<String>,
    pub root_binding_name: Option<String>,
    pub binding_table: Option<Handle<BindingTable>>,
}

scene_object!(Implementation, Implementation);

impl Implementation {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }
}

impl InheritDefaults for Implementation {
    fn inherit_from(&mut self, t: &Self) {
        if self.shader_language.is_none() {
            self.shader_language.clone_from(&t.shader_language);
        }
        self.shader_language_version = self.shader_language_version.or(t.shader_language_version);
        if self.render_api.is_none() {
            self.render_api.clone_from(&t.render_api);
        }
        if self.root_binding_name.is_none() {
            self.root_binding_name.clone_from(&t.root_binding_name);
        }
    }
}

/// Maps material properties to shader parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingTable {
    pub info: ObjectInfo,
    pub target_name: Option<String>,
    pub target_type: Option<String>,
    /// (material property, shader parameter) pairs; the first entry for a property wins.
    pub entries: Vec<(String, String)>,
}

scene_object!(BindingTable, BindingTable);

impl BindingTable {
    pub fn new(info: ObjectInfo) -> Self {
        Self { info, ..Default::default() }
    }

    /// Add one `Entry` row. The source loses any `Group|` prefix, and each
    /// column's type decides which name ends up on which side.
    pub fn add_entry(&mut self, source: &str, source_type: &str, target: &str, target_type: &str) {
        let source = source.rsplit('|').next().unwrap_or(source);
        let property = if source_type == PROPERTY_ENTRY { source } else { target };
        let parameter = if target_type == SEMANTIC_ENTRY { target } else { source };
        if self.parameter(property).is_none() {
            self.entries.push((property.to_string(), parameter.to_string()));
        }
    }

    /// Shader parameter bound to a material property.
    pub fn parameter(&self, property: &str) -> Option<&str> {
        self.entries.iter().find(|(p, _)| p == property).map(|(_, s)| s.as_str())
    }
}

impl InheritDefaults for BindingTable {
    fn inherit_from(&mut self, t: &Self) {
        if self.target_name.is_none() {
            self.target_name.clone_from(&t.target_name);
        }
        if self.target_type.is_none() {
            self.target_type.clone_from(&t.target_type);
        }
    }
}
