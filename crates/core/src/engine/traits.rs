//! Trait definitions for the engine module.

use async_trait::async_trait;

use super::error::EngineError;
use super::logs::LogSubscription;

/// The external transcoder.
///
/// Implementations own a flat virtual filesystem keyed by filename and run
/// commands whose arguments follow the ffmpeg command-line grammar. While
/// `exec` runs, diagnostic lines are published to log subscribers.
#[async_trait]
pub trait TranscoderEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// One-time asset load. Called once per session lifetime.
    async fn load(&self) -> Result<(), EngineError>;

    /// Stores bytes under `name`, replacing any previous content.
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError>;

    /// Reads bytes previously written or produced by a command.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Removes a virtual file. Missing files yield `FileNotFound`.
    async fn delete_file(&self, name: &str) -> Result<(), EngineError>;

    /// Runs one command to completion.
    async fn exec(&self, args: &[String]) -> Result<(), EngineError>;

    /// Starts listening to the diagnostic log.
    fn subscribe_logs(&self) -> LogSubscription;

    /// Releases engine resources. The engine may be loaded again afterwards.
    async fn shutdown(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
