//! Configuration for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the transcoding engine and its session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Base directory for session working directories (the virtual filesystem).
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Timeout for a single engine command in seconds.
    #[serde(default = "default_timeout")]
    pub exec_timeout_secs: u64,

    /// Log lines buffered per subscriber before it starts lagging.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Additional global ffmpeg arguments, placed before the command's own.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("transmute-engine")
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

fn default_log_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            work_dir: default_work_dir(),
            exec_timeout_secs: default_timeout(),
            log_capacity: default_log_capacity(),
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the working directory base.
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.exec_timeout_secs = timeout_secs;
        self
    }
}
