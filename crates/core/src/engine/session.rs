//! Explicitly owned handle to one transcoding engine.
//!
//! The session owns the engine lifecycle (`Unloaded` → `Loading` → `Ready`,
//! and back on dispose) and serializes every engine operation so that log
//! lines from one command are never observed by another command's listener.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::config::EngineConfig;
use super::error::EngineError;
use super::ffmpeg::FfmpegEngine;
use super::logs::LogSubscription;
use super::traits::TranscoderEngine;
use crate::metrics::{ENGINE_EXEC_DURATION, ENGINE_LOADS};

/// Lifecycle state of an [`EngineSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Session around a single [`TranscoderEngine`].
pub struct EngineSession {
    engine: Arc<dyn TranscoderEngine>,
    state: RwLock<SessionState>,
    /// Held for the whole load so concurrent `initialize` calls queue behind it.
    init_lock: Mutex<()>,
    /// One engine operation sequence at a time.
    ops_lock: Mutex<()>,
    exec_timeout: Duration,
}

impl EngineSession {
    /// Creates an unloaded session around an engine.
    pub fn new(engine: Arc<dyn TranscoderEngine>, exec_timeout: Duration) -> Self {
        Self {
            engine,
            state: RwLock::new(SessionState::Unloaded),
            init_lock: Mutex::new(()),
            ops_lock: Mutex::new(()),
            exec_timeout,
        }
    }

    /// Creates an unloaded session backed by the ffmpeg binary.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(FfmpegEngine::new(config.clone())),
            Duration::from_secs(config.exec_timeout_secs),
        )
    }

    /// Returns the engine implementation name.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Whether engine operations are currently allowed.
    pub async fn is_ready(&self) -> bool {
        self.state().await == SessionState::Ready
    }

    /// Loads the engine once.
    ///
    /// Returns immediately when already ready. Callers arriving while a load
    /// is in flight wait for it and do not trigger another. A failed load
    /// leaves the session `Unloaded` so a later call can retry.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        if self.is_ready().await {
            return Ok(());
        }

        let _init = self.init_lock.lock().await;
        if self.is_ready().await {
            return Ok(());
        }

        *self.state.write().await = SessionState::Loading;
        info!(engine = self.engine.name(), "Loading transcoding engine");
        let start = Instant::now();

        match self.engine.load().await {
            Ok(()) => {
                *self.state.write().await = SessionState::Ready;
                ENGINE_LOADS.with_label_values(&["success"]).inc();
                info!(
                    engine = self.engine.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Transcoding engine ready"
                );
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = SessionState::Unloaded;
                ENGINE_LOADS.with_label_values(&["failed"]).inc();
                error!(engine = self.engine.name(), "Engine load failed: {}", e);
                Err(e)
            }
        }
    }

    /// Shuts the engine down and returns the session to `Unloaded`.
    ///
    /// Waits for the operation in flight, if any.
    pub async fn dispose(&self) -> Result<(), EngineError> {
        let _init = self.init_lock.lock().await;
        let _ops = self.ops_lock.lock().await;

        let previous = std::mem::replace(&mut *self.state.write().await, SessionState::Unloaded);
        if previous == SessionState::Unloaded {
            return Ok(());
        }

        info!(engine = self.engine.name(), "Disposing transcoding engine");
        self.engine.shutdown().await
    }

    /// Takes exclusive use of the engine until the lease is dropped.
    pub async fn lease(&self) -> Result<EngineLease<'_>, EngineError> {
        if !self.is_ready().await {
            return Err(EngineError::NotReady);
        }

        let guard = self.ops_lock.lock().await;

        // The session may have been disposed while we queued.
        if !self.is_ready().await {
            return Err(EngineError::NotReady);
        }

        Ok(EngineLease {
            session: self,
            _guard: guard,
        })
    }

    /// Stages bytes into the virtual filesystem.
    pub async fn write_virtual_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        self.lease().await?.write_file(name, data).await
    }

    /// Runs one command and waits for it to finish.
    pub async fn execute(&self, args: &[String]) -> Result<(), EngineError> {
        self.lease().await?.execute(args).await
    }

    /// Reads bytes from the virtual filesystem.
    pub async fn read_virtual_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.lease().await?.read_file(name).await
    }

    /// Removes a file from the virtual filesystem.
    pub async fn remove_virtual_file(&self, name: &str) -> Result<(), EngineError> {
        self.lease().await?.delete_file(name).await
    }
}

/// Exclusive access to a ready engine.
pub struct EngineLease<'a> {
    session: &'a EngineSession,
    _guard: MutexGuard<'a, ()>,
}

impl EngineLease<'_> {
    fn engine(&self) -> &dyn TranscoderEngine {
        self.session.engine.as_ref()
    }

    pub async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        debug!(file = name, bytes = data.len(), "Writing virtual file");
        self.engine().write_file(name, data).await
    }

    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        debug!(file = name, "Reading virtual file");
        self.engine().read_file(name).await
    }

    pub async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        debug!(file = name, "Deleting virtual file");
        self.engine().delete_file(name).await
    }

    /// Starts listening to the engine log for the duration of this lease's work.
    pub fn subscribe_logs(&self) -> LogSubscription {
        self.engine().subscribe_logs()
    }

    /// Runs one command, bounded by the session's timeout.
    pub async fn execute(&self, args: &[String]) -> Result<(), EngineError> {
        debug!(args = ?args, "Executing engine command");
        let start = Instant::now();

        let result = match timeout(self.session.exec_timeout, self.engine().exec(args)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                timeout_secs: self.session.exec_timeout.as_secs(),
            }),
        };

        let label = match &result {
            Ok(()) => "success",
            Err(EngineError::Timeout { .. }) => "timeout",
            Err(_) => "failed",
        };
        ENGINE_EXEC_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use tokio_test::{assert_err, assert_ok};

    fn session_with(engine: &Arc<MockEngine>) -> EngineSession {
        EngineSession::new(engine.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_operations_require_ready() {
        let engine = Arc::new(MockEngine::new());
        let session = session_with(&engine);

        assert_eq!(session.state().await, SessionState::Unloaded);
        assert!(matches!(
            session.write_virtual_file("a.png", b"x").await,
            Err(EngineError::NotReady)
        ));
        assert!(matches!(
            session.execute(&["-i".to_string(), "a.png".to_string()]).await,
            Err(EngineError::NotReady)
        ));
        assert!(matches!(
            session.read_virtual_file("a.png").await,
            Err(EngineError::NotReady)
        ));
        assert_eq!(engine.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let engine = Arc::new(MockEngine::new());
        let session = session_with(&engine);

        assert_ok!(session.initialize().await);
        assert_ok!(session.initialize().await);
        assert_eq!(session.state().await, SessionState::Ready);
        assert_eq!(engine.load_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_loads_once() {
        let engine = Arc::new(MockEngine::new());
        engine.set_load_delay(Duration::from_millis(50)).await;
        let session = Arc::new(session_with(&engine));

        let calls = (0..8).map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.initialize().await })
        });
        for result in futures::future::join_all(calls).await {
            assert_ok!(result.unwrap());
        }

        assert_eq!(engine.load_count().await, 1);
        assert_eq!(session.state().await, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_state_is_loading_during_load() {
        let engine = Arc::new(MockEngine::new());
        engine.set_load_delay(Duration::from_millis(100)).await;
        let session = Arc::new(session_with(&engine));

        let loader = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.initialize().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.state().await, SessionState::Loading);
        assert!(matches!(session.lease().await, Err(EngineError::NotReady)));

        assert_ok!(loader.await.unwrap());
        assert_eq!(session.state().await, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let engine = Arc::new(MockEngine::new());
        engine
            .set_next_load_error(EngineError::load_failed("wasm fetch failed"))
            .await;
        let session = session_with(&engine);

        let err = assert_err!(session.initialize().await);
        assert!(matches!(err, EngineError::LoadFailed { .. }));
        assert_eq!(session.state().await, SessionState::Unloaded);

        assert_ok!(session.initialize().await);
        assert_eq!(session.state().await, SessionState::Ready);
        assert_eq!(engine.load_count().await, 2);
    }

    #[tokio::test]
    async fn test_virtual_file_roundtrip_and_missing() {
        let engine = Arc::new(MockEngine::new());
        let session = session_with(&engine);
        session.initialize().await.unwrap();

        session.write_virtual_file("in.wav", b"RIFF").await.unwrap();
        assert_eq!(session.read_virtual_file("in.wav").await.unwrap(), b"RIFF");

        session.remove_virtual_file("in.wav").await.unwrap();
        assert!(matches!(
            session.read_virtual_file("in.wav").await,
            Err(EngineError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let engine = Arc::new(MockEngine::new());
        engine.set_exec_delay(Duration::from_secs(5)).await;
        let session = EngineSession::new(engine.clone(), Duration::from_millis(50));
        session.initialize().await.unwrap();

        let args = vec!["-i".to_string(), "slow.mkv".to_string()];
        let err = assert_err!(session.execute(&args).await);
        assert!(matches!(err, EngineError::Timeout { .. }));
        assert!(err.is_execution_failure());
    }

    #[tokio::test]
    async fn test_dispose_returns_to_unloaded() {
        let engine = Arc::new(MockEngine::new());
        let session = session_with(&engine);
        session.initialize().await.unwrap();

        session.dispose().await.unwrap();
        assert_eq!(session.state().await, SessionState::Unloaded);
        assert_eq!(engine.shutdown_count().await, 1);
        assert!(matches!(session.lease().await, Err(EngineError::NotReady)));

        // Disposing twice is a no-op.
        session.dispose().await.unwrap();
        assert_eq!(engine.shutdown_count().await, 1);

        session.initialize().await.unwrap();
        assert_eq!(engine.load_count().await, 2);
    }

    #[tokio::test]
    async fn test_leases_are_exclusive() {
        let engine = Arc::new(MockEngine::new());
        let session = Arc::new(session_with(&engine));
        session.initialize().await.unwrap();

        let lease = session.lease().await.unwrap();
        let waiter = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.write_virtual_file("b.png", b"2").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        lease.write_file("a.png", b"1").await.unwrap();
        drop(lease);

        assert_ok!(waiter.await.unwrap());
        assert_eq!(engine.write_count().await, 2);
    }
}
