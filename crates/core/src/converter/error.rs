//! Error types for the converter module.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Convert was requested before a target was chosen.
    #[error("No target format selected")]
    NoTargetSelected,

    /// The target is not reachable from the file's source type.
    #[error("Unsupported target format: {target} (available: {})", .available.join(", "))]
    UnsupportedTarget {
        target: String,
        available: Vec<String>,
    },

    /// The engine raised while converting.
    #[error("Conversion failed: {0}")]
    Conversion(#[source] EngineError),

    /// The command succeeded but produced no output file.
    #[error("Conversion output missing: {name}")]
    OutputMissing { name: String },
}

impl ConvertError {
    /// Whether the request was refused before reaching the engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NoTargetSelected | Self::UnsupportedTarget { .. })
    }
}

impl From<EngineError> for ConvertError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::FileNotFound { name } => Self::OutputMissing { name },
            other => Self::Conversion(other),
        }
    }
}
