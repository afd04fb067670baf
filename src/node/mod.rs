//! Node tree the importer consumes.
//!
//! The tree itself is produced by a tokenizer outside this crate; this module
//! defines its shape and the helpers used to read it:
//! - [`Node`] - named node with typed properties and children
//! - [`Property`] - typed value, including binary array payload decoding
//! - [`NodeTag`] - interned node names for dispatch
//! - [`PropertyEntry`] - view over a `Properties70/P` entry
//! - [`load_json`] - JSON interchange loader

mod json;
mod property;
mod tag;
mod tree;

pub use json::load_json;
pub use property::Property;
pub use tag::NodeTag;
pub use tree::{property_entry, split_object_name, Node, PropertyEntry};
