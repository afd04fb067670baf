//! Error types for the FBX scene library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FBX scene operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Document version below the supported minimum (7000)
    #[error("Unsupported FBX version: {0}")]
    UnsupportedVersion(u32),

    /// A bind pose or parent matrix could not be inverted
    #[error("Could not invert matrix: {0}")]
    NonInvertibleMatrix(String),

    /// Additive layer blending with per-channel rotation accumulation
    #[error("Rotation accumulation by channel is not supported")]
    UnsupportedRotationAccumulation,

    /// Property value has an unexpected shape
    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    /// Compressed array payload could not be inflated
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// Invalid data structure in the node tree
    #[error("Invalid node tree: {0}")]
    InvalidStructure(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON node tree could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an invalid property error.
    pub fn property(msg: impl Into<String>) -> Self {
        Self::InvalidProperty(msg.into())
    }
}

/// Result type alias for FBX scene operations.
pub type Result<T> = std::result::Result<T, Error>;
