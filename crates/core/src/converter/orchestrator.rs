//! Drives one file through stage → execute → read-back.

use std::pin::pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::ConversionProfiles;
use super::error::ConvertError;
use super::progress::{ConversionProgress, ProgressTracker};
use crate::engine::{EngineError, EngineLease, EngineSession};
use crate::files::FileRecord;
use crate::formats::MediaFamily;
use crate::metrics::CONVERSIONS_TOTAL;

/// One conversion command and the virtual files it touches.
///
/// Names are unique per command, so the input and output never collide
/// even when the target equals the file's declared extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionCommand {
    /// Virtual name the source bytes are staged under.
    pub input: String,
    /// Virtual name the engine writes the result to.
    pub output: String,
    pub args: Vec<String>,
}

/// Converts selected files with the session's engine.
pub struct ConversionOrchestrator {
    session: Arc<EngineSession>,
    profiles: ConversionProfiles,
}

impl ConversionOrchestrator {
    pub fn new(session: Arc<EngineSession>, profiles: ConversionProfiles) -> Self {
        Self { session, profiles }
    }

    pub fn profiles(&self) -> &ConversionProfiles {
        &self.profiles
    }

    /// Builds `-i <input> <family flags> -y <output>` for the file's target.
    ///
    /// Fails without touching the engine when no valid target is chosen.
    pub fn build_command(&self, file: &FileRecord) -> Result<ConversionCommand, ConvertError> {
        let (family, target) = self.validate_target(file)?;
        Ok(self.command_for(file, family, &target))
    }

    /// Converts `file` to its chosen target and stores the result bytes.
    ///
    /// Returns `Ok(false)` without converting when the engine session is not
    /// ready, so callers can disable the action instead of failing.
    pub async fn convert(&self, file: &mut FileRecord) -> Result<bool, ConvertError> {
        self.run(file, None).await
    }

    /// Like [`convert`](Self::convert), also reporting progress parsed from
    /// the engine log. A closed receiver does not stop the conversion.
    pub async fn convert_with_progress(
        &self,
        file: &mut FileRecord,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<bool, ConvertError> {
        self.run(file, Some(progress_tx)).await
    }

    async fn run(
        &self,
        file: &mut FileRecord,
        progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    ) -> Result<bool, ConvertError> {
        let (family, target) = match self.validate_target(file) {
            Ok(validated) => validated,
            Err(e) => {
                let family = file.target_family().map_or("unknown", |f| f.as_str());
                CONVERSIONS_TOTAL
                    .with_label_values(&[family, "rejected"])
                    .inc();
                debug!(file = %file.name, "Conversion rejected: {}", e);
                return Err(e);
            }
        };
        let command = self.command_for(file, family, &target);

        let lease = match self.session.lease().await {
            Ok(lease) => lease,
            Err(EngineError::NotReady) => {
                CONVERSIONS_TOTAL
                    .with_label_values(&[family.as_str(), "not_ready"])
                    .inc();
                warn!(file = %file.name, "Engine not ready, conversion skipped");
                return Ok(false);
            }
            Err(e) => return Err(ConvertError::Conversion(e)),
        };

        info!(
            file = %file.name,
            target = %target,
            family = %family,
            input = %command.input,
            output = %command.output,
            "Starting conversion"
        );
        file.begin_conversion();

        let result = self
            .convert_leased(&lease, file, &command, progress_tx)
            .await;
        cleanup(&lease, &[&command.input, &command.output]).await;

        match result {
            Ok(bytes) => {
                info!(file = %file.name, bytes = bytes.len(), "Conversion complete");
                file.mark_converted(bytes);
                CONVERSIONS_TOTAL
                    .with_label_values(&[family.as_str(), "success"])
                    .inc();
                Ok(true)
            }
            Err(e) => {
                warn!(file = %file.name, "Conversion failed: {}", e);
                file.mark_failed(e.to_string());
                CONVERSIONS_TOTAL
                    .with_label_values(&[family.as_str(), "failed"])
                    .inc();
                Err(e)
            }
        }
    }

    async fn convert_leased(
        &self,
        lease: &EngineLease<'_>,
        file: &mut FileRecord,
        command: &ConversionCommand,
        progress_tx: Option<mpsc::Sender<ConversionProgress>>,
    ) -> Result<Vec<u8>, ConvertError> {
        lease
            .write_file(&command.input, &file.raw_data)
            .await
            .map_err(ConvertError::Conversion)?;

        match progress_tx {
            None => lease
                .execute(&command.args)
                .await
                .map_err(ConvertError::Conversion)?,
            Some(tx) => execute_with_progress(lease, file, &command.args, &tx).await?,
        }

        lease.read_file(&command.output).await.map_err(|e| match e {
            EngineError::FileNotFound { .. } => ConvertError::OutputMissing {
                name: file.output_name().unwrap_or_else(|| command.output.clone()),
            },
            other => ConvertError::Conversion(other),
        })
    }

    fn command_for(
        &self,
        file: &FileRecord,
        family: MediaFamily,
        target: &str,
    ) -> ConversionCommand {
        let job = Uuid::new_v4().simple();
        let input = match file.source_type.as_deref() {
            Some(ext) => format!("in-{}.{}", job, ext),
            None => format!("in-{}", job),
        };
        let output = format!("out-{}.{}", job, target);

        let mut args = vec!["-i".to_string(), input.clone()];
        args.extend(self.profiles.flags_for(family).iter().cloned());
        args.push("-y".to_string());
        args.push(output.clone());

        ConversionCommand {
            input,
            output,
            args,
        }
    }

    /// Checks the chosen target and returns it with its family.
    fn validate_target(&self, file: &FileRecord) -> Result<(MediaFamily, String), ConvertError> {
        let target = file
            .target_type
            .as_deref()
            .ok_or(ConvertError::NoTargetSelected)?;

        let family = match file.target_family() {
            Some(family) if file.has_valid_target() => family,
            _ => {
                return Err(ConvertError::UnsupportedTarget {
                    target: target.to_string(),
                    available: file.available_targets.clone(),
                })
            }
        };

        Ok((family, target.to_string()))
    }
}

async fn execute_with_progress(
    lease: &EngineLease<'_>,
    file: &mut FileRecord,
    args: &[String],
    tx: &mpsc::Sender<ConversionProgress>,
) -> Result<(), ConvertError> {
    let mut logs = lease.subscribe_logs();
    let mut tracker = ProgressTracker::new();
    let mut exec = pin!(lease.execute(args));

    let mut report = |file: &mut FileRecord, line: &str| {
        if let Some(percent) = tracker.observe(line) {
            file.set_progress(percent);
            // Non-blocking send
            let _ = tx.try_send(ConversionProgress {
                file_name: file.name.clone(),
                percent,
            });
        }
    };

    let result = loop {
        tokio::select! {
            biased;
            event = logs.recv() => match event {
                Some(event) => report(file, &event.message),
                None => break exec.as_mut().await,
            },
            result = exec.as_mut() => {
                for event in logs.drain() {
                    report(file, &event.message);
                }
                break result;
            }
        }
    };

    result.map_err(ConvertError::Conversion)
}

/// Best-effort removal of staged files.
async fn cleanup(lease: &EngineLease<'_>, names: &[&str]) {
    for name in names {
        match lease.delete_file(name).await {
            Ok(()) | Err(EngineError::FileNotFound { .. }) => {}
            Err(e) => warn!(file = %name, "Failed to remove virtual file: {}", e),
        }
    }
}
