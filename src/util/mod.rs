//! Utility types and functions for the FBX scene library.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`Arena`] / [`Handle`] - Typed object storage with index handles
//! - Math type re-exports from glam plus handedness and Euler helpers

mod arena;
mod error;
mod math;

pub use arena::*;
pub use error::*;
pub use math::*;
