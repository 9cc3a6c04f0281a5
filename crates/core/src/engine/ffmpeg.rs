//! FFmpeg-process engine implementation.
//!
//! The virtual filesystem is a private working directory created at load
//! time; commands run with it as their current directory so that bare
//! virtual filenames resolve inside it.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Command;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::config::EngineConfig;
use super::error::EngineError;
use super::logs::{LogBus, LogSubscription};
use super::traits::TranscoderEngine;

/// Engine backed by the ffmpeg binary.
pub struct FfmpegEngine {
    config: EngineConfig,
    logs: LogBus,
    session_dir: RwLock<Option<PathBuf>>,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let logs = LogBus::new(config.log_capacity);
        Self {
            config,
            logs,
            session_dir: RwLock::new(None),
        }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Working directory of the loaded session, if any.
    pub async fn session_dir(&self) -> Option<PathBuf> {
        self.session_dir.read().await.clone()
    }

    /// Virtual names are single path components that ffmpeg cannot mistake
    /// for an option.
    fn validate_name(name: &str) -> Result<(), EngineError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.starts_with('-')
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0');

        if invalid {
            return Err(EngineError::InvalidFileName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn loaded_dir(&self) -> Result<PathBuf, EngineError> {
        self.session_dir().await.ok_or(EngineError::NotReady)
    }

    async fn resolve(&self, name: &str) -> Result<PathBuf, EngineError> {
        Self::validate_name(name)?;
        Ok(self.loaded_dir().await?.join(name))
    }

    /// Builds the full ffmpeg argument list for a command.
    fn build_args(&self, args: &[String]) -> Vec<String> {
        let mut full = vec!["-nostdin".to_string()];
        full.extend(self.config.extra_args.iter().cloned());
        full.extend(args.iter().cloned());
        full
    }

    fn map_spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::BinaryNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            EngineError::Io(e)
        }
    }
}

#[async_trait]
impl TranscoderEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self) -> Result<(), EngineError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "{} -version exited with code: {:?}",
                self.config.ffmpeg_path.display(),
                output.status.code()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = version.lines().next() {
            tracing::info!("Using {}", first_line);
        }

        let dir = self
            .config
            .work_dir
            .join(format!("session-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Created engine working directory");

        *self.session_dir.write().await = Some(dir);
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        let path = self.resolve(name).await?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.resolve(name).await?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::file_not_found(name)
            } else {
                EngineError::Io(e)
            }
        })
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        let path = self.resolve(name).await?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::file_not_found(name)
            } else {
                EngineError::Io(e)
            }
        })
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        let dir = self.loaded_dir().await?;

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(self.build_args(args))
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::execution("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr);
        let mut splitter = LineSplitter::default();
        let mut error_output = String::new();

        let mut publish = |line: String| {
            if line.contains("Error") || line.contains("error") {
                error_output.push_str(&line);
                error_output.push('\n');
            }
            self.logs.emit(line);
        };

        loop {
            let consumed = {
                let chunk = reader.fill_buf().await?;
                if chunk.is_empty() {
                    break;
                }
                splitter.push(chunk).into_iter().for_each(&mut publish);
                chunk.len()
            };
            reader.consume(consumed);
        }
        if let Some(rest) = splitter.finish() {
            publish(rest);
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(EngineError::execution(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        Ok(())
    }

    fn subscribe_logs(&self) -> LogSubscription {
        self.logs.subscribe()
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let dir = self.session_dir.write().await.take();
        if let Some(dir) = dir {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(EngineError::Io(e)),
            }
        }
        Ok(())
    }
}

/// Splits a byte stream into lines on `\n` and `\r`.
///
/// ffmpeg rewrites its stats line with carriage returns, so both count as
/// line ends. Empty lines are dropped.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' || b == b'\r' {
                if let Some(line) = self.take_pending() {
                    lines.push(line);
                }
            } else {
                self.pending.push(b);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_name() {
        assert!(FfmpegEngine::validate_name("clip.mov").is_ok());
        assert!(FfmpegEngine::validate_name("my clip (1).mov").is_ok());
        for bad in ["", ".", "..", "../etc/passwd", "a/b.mp4", "a\\b.mp4", "-y"] {
            assert!(
                matches!(
                    FfmpegEngine::validate_name(bad),
                    Err(EngineError::InvalidFileName { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_build_args_prepends_globals() {
        let config = EngineConfig {
            extra_args: vec!["-threads".to_string(), "2".to_string()],
            ..Default::default()
        };
        let engine = FfmpegEngine::new(config);
        let args = engine.build_args(&["-i".to_string(), "a.png".to_string()]);
        assert_eq!(args, vec!["-nostdin", "-threads", "2", "-i", "a.png"]);
    }

    #[test]
    fn test_line_splitter_handles_carriage_returns() {
        let mut splitter = LineSplitter::default();
        let lines = splitter.push(b"Stream #0:0: Video: h264,\nframe=1 time=00:00:01.00\rframe=2 ");
        assert_eq!(
            lines,
            vec!["Stream #0:0: Video: h264,", "frame=1 time=00:00:01.00"]
        );
        let lines = splitter.push(b"time=00:00:02.00\r\n");
        assert_eq!(lines, vec!["frame=2 time=00:00:02.00"]);
        assert_eq!(splitter.finish(), None);

        splitter.push(b"tail without newline");
        assert_eq!(splitter.finish().as_deref(), Some("tail without newline"));
    }

    #[tokio::test]
    async fn test_operations_before_load_are_not_ready() {
        let engine = FfmpegEngine::with_defaults();
        assert!(matches!(
            engine.write_file("a.png", b"x").await,
            Err(EngineError::NotReady)
        ));
        assert!(matches!(
            engine.exec(&["-i".to_string(), "a.png".to_string()]).await,
            Err(EngineError::NotReady)
        ));
    }

    #[tokio::test]
    async fn test_load_missing_binary() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::with_ffmpeg_path(PathBuf::from("/nonexistent/ffmpeg"))
            .with_work_dir(temp.path().to_path_buf());
        let engine = FfmpegEngine::new(config);

        let err = engine.load().await.unwrap_err();
        assert!(matches!(err, EngineError::BinaryNotFound { .. }));
        assert!(engine.session_dir().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_virtual_files_live_in_session_dir() {
        let temp = TempDir::new().unwrap();
        // `true` accepts any arguments and exits 0, which is all load() checks.
        let config = EngineConfig::with_ffmpeg_path(PathBuf::from("true"))
            .with_work_dir(temp.path().to_path_buf());
        let engine = FfmpegEngine::new(config);
        engine.load().await.unwrap();

        let dir = engine.session_dir().await.unwrap();
        assert!(dir.starts_with(temp.path()));

        engine.write_file("in.wav", b"RIFF").await.unwrap();
        assert!(dir.join("in.wav").exists());
        assert_eq!(engine.read_file("in.wav").await.unwrap(), b"RIFF");

        engine.delete_file("in.wav").await.unwrap();
        assert!(matches!(
            engine.read_file("in.wav").await,
            Err(EngineError::FileNotFound { .. })
        ));
        assert!(matches!(
            engine.write_file("../escape.wav", b"x").await,
            Err(EngineError::InvalidFileName { .. })
        ));

        engine.exec(&["-i".to_string(), "in.wav".to_string()]).await.unwrap();

        engine.shutdown().await.unwrap();
        assert!(!dir.exists());
        assert!(engine.session_dir().await.is_none());
    }
}
