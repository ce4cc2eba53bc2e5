//! Error types for the vecindex library.
//!
//! All fallible operations outside the persistence codec return
//! [`VecIndexError`]; the codec narrows failures further into its own closed
//! taxonomies (see [`crate::container`]).

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for vecindex operations.
#[derive(Error, Debug)]
pub enum VecIndexError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Engine-level errors (training, searching, serialization)
    #[error("Engine error: {0}")]
    Engine(String),

    /// An engine rejected persisted state as malformed or incompatible
    #[error("Load error: {0}")]
    Load(String),

    /// A configuration value was accessed as the wrong type
    #[error("Type mismatch for parameter '{key}': expected {expected}, found {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with VecIndexError.
pub type Result<T> = std::result::Result<T, VecIndexError>;

impl VecIndexError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        VecIndexError::Storage(msg.into())
    }

    /// Create a new engine error.
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        VecIndexError::Engine(msg.into())
    }

    /// Create a new load error.
    pub fn load<S: Into<String>>(msg: S) -> Self {
        VecIndexError::Load(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        VecIndexError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VecIndexError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
