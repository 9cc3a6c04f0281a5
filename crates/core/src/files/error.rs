//! Error types for the files module.

use thiserror::Error;

/// Errors from the per-session file registry.
#[derive(Debug, Error)]
pub enum FileError {
    /// The name cannot be used as a virtual filename.
    #[error("Invalid file name: {name:?}")]
    InvalidName { name: String },

    /// Names are unique per session.
    #[error("File already selected: {name}")]
    Duplicate { name: String },

    /// No file with this name in the session.
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Payload exceeds the configured upload limit.
    #[error("File too large: {size_bytes} bytes (max {max_bytes})")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

impl FileError {
    /// Creates a new not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
