//! # FBX scene
//!
//! Turns a parsed FBX node tree into a typed scene document: a model
//! hierarchy with converted transforms, triangulated meshes, materials and
//! textures, skin and blend-shape deformers, and resampled animation curves.
//!
//! Tokenizing the file itself is left to the caller; the tree can be built in
//! memory or loaded from its JSON interchange form.
//!
//! ## Modules
//!
//! - [`util`] - Errors, arenas and math helpers
//! - [`node`] - Node tree, typed properties and tag interning
//! - [`core`] - Time base, global settings, coordinate conversion, import options
//! - [`scene`] - The [`Document`] and every scene object type
//! - [`builders`] - Header, definitions and per-object readers
//! - [`connections`] - Two-pass connection resolution
//! - [`anim`] - Curves, tangents, layer blending and resampling
//! - [`geom`] - Layer access, triangulation and deformers
//! - [`processor`] - The phase pipeline
//!
//! ## Example
//!
//! ```ignore
//! use fbx_scene::prelude::*;
//!
//! let doc = fbx_scene::load("scene.json", &ImportOptions::default())?;
//! for model in doc.models.iter() {
//!     println!("{} {:?}", model.info.name, model.transform.translation);
//! }
//! ```

pub mod util;
pub mod node;
pub mod core;
pub mod scene;
pub mod builders;
pub mod connections;
pub mod anim;
pub mod geom;
pub mod processor;

// Re-export commonly used types
pub use crate::core::ImportOptions;
pub use processor::{load, process, process_with_progress, Phase};
pub use scene::Document;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anim::{Animation, AnimationCurveBinding, GenericCurve, Keyframe};
    pub use crate::core::{AnimationType, ImportOptions, PivotMode};
    pub use crate::node::{Node, NodeTag, Property};
    pub use crate::processor::{load, process, process_with_progress, Phase};
    pub use crate::scene::{Document, Geometry, Material, Model, ModelKind, Texture};
    pub use crate::util::{Error, Handle, Result};
}
