//! Converter module for transcoding selected files.
//!
//! [`ConversionOrchestrator`] takes a [`FileRecord`](crate::files::FileRecord)
//! with a chosen target, stages its bytes in the engine's virtual
//! filesystem under a name unique to the command, runs it and reads the
//! output back.
//!
//! # Example
//!
//! ```ignore
//! use transmute_core::converter::{ConversionOrchestrator, ConversionProfiles};
//!
//! let orchestrator = ConversionOrchestrator::new(session, ConversionProfiles::default());
//!
//! file.select_target("mp4")?;
//! if orchestrator.convert(&mut file).await? {
//!     println!("{} bytes", file.result_bytes().map_or(0, |b| b.len()));
//! }
//! ```

mod config;
mod error;
mod orchestrator;
mod progress;

pub use config::ConversionProfiles;
pub use error::ConvertError;
pub use orchestrator::{ConversionCommand, ConversionOrchestrator};
pub use progress::{ConversionProgress, ProgressTracker};
