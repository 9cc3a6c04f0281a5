//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the transcoding engine or its session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session has not been initialized (or was disposed).
    #[error("Engine not ready")]
    NotReady,

    /// The one-time engine load failed.
    #[error("Engine failed to load: {reason}")]
    LoadFailed { reason: String },

    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The engine raised while running a command.
    #[error("Engine command failed: {message}")]
    Execution {
        message: String,
        stderr: Option<String>,
    },

    /// A virtual file was expected but is absent.
    #[error("Virtual file not found: {name}")]
    FileNotFound { name: String },

    /// Virtual filenames are flat; separators and parent references are refused.
    #[error("Invalid virtual file name: {name}")]
    InvalidFileName { name: String },

    /// A command ran longer than the configured limit.
    #[error("Engine command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error against the engine's working storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new execution error with optional stderr output.
    pub fn execution(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            stderr,
        }
    }

    /// Creates a new load failure.
    pub fn load_failed(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new missing file error.
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::FileNotFound { name: name.into() }
    }

    /// Whether retrying after `initialize()` can help.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// Whether the failure came from running a command rather than from
    /// session state or storage.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution { .. } | Self::Timeout { .. })
    }
}
