//! Engine module: the boundary to the external transcoder.
//!
//! The transcoder is treated as an opaque capability exposing a flat
//! virtual filesystem, a command runner that follows the ffmpeg argument
//! grammar, and a diagnostic log stream. `EngineSession` wraps one engine
//! with an explicit lifecycle and serializes access to it.
//!
//! # Example
//!
//! ```ignore
//! use transmute_core::engine::{EngineConfig, EngineSession};
//!
//! let session = EngineSession::from_config(&EngineConfig::default());
//! session.initialize().await?;
//!
//! session.write_virtual_file("clip.mov", &bytes).await?;
//! session.execute(&["-i".into(), "clip.mov".into(), "-y".into(), "clip.mp4".into()]).await?;
//! let output = session.read_virtual_file("clip.mp4").await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod logs;
mod session;
mod traits;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use logs::{LogBus, LogEvent, LogSubscription};
pub use session::{EngineLease, EngineSession, SessionState};
pub use traits::TranscoderEngine;
