//! Probe-based format detection.

use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, info};

use super::parser::{LogFormatParser, StreamInfoParser};
use crate::engine::{EngineError, EngineSession};
use crate::files::FileRecord;
use crate::metrics::DETECTIONS_TOTAL;

/// Detects a file's real format by letting the engine describe its streams.
pub struct FormatSniffer {
    session: Arc<EngineSession>,
    parser: Box<dyn LogFormatParser>,
}

impl FormatSniffer {
    pub fn new(session: Arc<EngineSession>) -> Self {
        Self::with_parser(session, Box::new(StreamInfoParser))
    }

    pub fn with_parser(session: Arc<EngineSession>, parser: Box<dyn LogFormatParser>) -> Self {
        Self { session, parser }
    }

    /// Probes `file` and records the outcome on it.
    ///
    /// Returns the first format reported in the engine log, or `None` when
    /// the probe ends without one. The probe has no output, so a failing
    /// command is expected and only means the format is undetermined. The
    /// only error is `NotReady`.
    pub async fn detect(&self, file: &mut FileRecord) -> Result<Option<String>, EngineError> {
        let lease = self.session.lease().await?;

        let detected = match lease.write_file(&file.name, &file.raw_data).await {
            Ok(()) => {
                let args = ["-i".to_string(), file.name.clone()];
                let mut logs = lease.subscribe_logs();
                let mut probe = pin!(lease.execute(&args));

                let detected = loop {
                    tokio::select! {
                        biased;
                        event = logs.recv() => match event {
                            Some(event) => {
                                if let Some(format) = self.parser.parse_line(&event.message) {
                                    break Some(format);
                                }
                            }
                            None => {
                                log_probe_result(&file.name, probe.as_mut().await);
                                break None;
                            }
                        },
                        result = probe.as_mut() => {
                            log_probe_result(&file.name, result);
                            break logs
                                .drain()
                                .iter()
                                .find_map(|event| self.parser.parse_line(&event.message));
                        }
                    }
                };
                drop(logs);
                detected
            }
            Err(e) => {
                debug!(file = %file.name, "Failed to stage file for probing: {}", e);
                None
            }
        };

        if let Err(e) = lease.delete_file(&file.name).await {
            debug!(file = %file.name, "Probe input not removed: {}", e);
        }

        let label = if detected.is_some() {
            "detected"
        } else {
            "undetermined"
        };
        DETECTIONS_TOTAL.with_label_values(&[label]).inc();
        info!(
            file = %file.name,
            format = detected.as_deref().unwrap_or("undetermined"),
            "Format detection finished"
        );

        file.apply_detection(detected.as_deref());
        Ok(detected)
    }
}

fn log_probe_result(file: &str, result: Result<(), EngineError>) {
    match result {
        Ok(()) => debug!(file, "Probe command completed"),
        Err(e) => debug!(file, "Probe command ended: {}", e),
    }
}
