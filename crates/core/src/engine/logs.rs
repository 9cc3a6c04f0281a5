//! Diagnostic log stream emitted by the engine while a command runs.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// One diagnostic line from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
}

impl LogEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fan-out of engine log lines to any number of listeners.
///
/// Lines emitted while nobody listens are dropped.
#[derive(Debug, Clone)]
pub struct LogBus {
    tx: broadcast::Sender<LogEvent>,
}

impl LogBus {
    /// Creates a bus buffering up to `capacity` lines per slow listener.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes a line to all current listeners.
    pub fn emit(&self, message: impl Into<String>) {
        // No receivers is not an error for a log stream.
        let _ = self.tx.send(LogEvent::new(message));
    }

    /// Starts listening. The listener is removed when the returned
    /// subscription is dropped.
    pub fn subscribe(&self) -> LogSubscription {
        LogSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live listener on a [`LogBus`].
#[derive(Debug)]
pub struct LogSubscription {
    rx: broadcast::Receiver<LogEvent>,
}

impl LogSubscription {
    /// Waits for the next line. Returns `None` once the bus is gone.
    ///
    /// Lines lost to lag are skipped with a warning.
    pub async fn recv(&mut self) -> Option<LogEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Log subscriber lagged, skipped {} lines", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Takes every line already buffered without waiting.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Log subscriber lagged, skipped {} lines", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }
}
