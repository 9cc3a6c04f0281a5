//! Mock transcoding engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{EngineError, LogBus, LogSubscription, TranscoderEngine};

/// Operation counters for assertions.
#[derive(Debug, Clone, Default)]
struct Calls {
    loads: usize,
    writes: usize,
    reads: usize,
    deletes: usize,
    shutdowns: usize,
    execs: Vec<Vec<String>>,
}

/// In-memory implementation of the TranscoderEngine trait.
///
/// Provides controllable behavior for testing:
/// - Count every engine call for assertions
/// - Emit scripted log lines during each command
/// - Simulate load/exec failures and slow operations
/// - Produce (or withhold) output files for conversion commands
///
/// Commands are interpreted loosely after the ffmpeg grammar: the value
/// after `-i` is the input, and a trailing argument beyond it is the
/// output. A command without output fails the way an ffmpeg probe does.
///
/// # Example
///
/// ```rust,ignore
/// use transmute_core::testing::MockEngine;
///
/// let engine = Arc::new(MockEngine::new());
/// engine.set_exec_logs(["Stream #0:0: Video: png, rgba(pc), 100x100"]).await;
///
/// let session = EngineSession::new(engine.clone(), Duration::from_secs(5));
/// session.initialize().await?;
///
/// assert_eq!(engine.load_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockEngine {
    files: RwLock<HashMap<String, Vec<u8>>>,
    logs: LogBus,
    calls: RwLock<Calls>,
    /// Lines emitted on every command.
    exec_logs: RwLock<Vec<String>>,
    /// Whether the command yields to the scheduler after each line.
    yield_between_lines: RwLock<bool>,
    /// If set, the next load fails with this error.
    next_load_error: RwLock<Option<EngineError>>,
    /// If set, the next command fails with this error after emitting its logs.
    next_exec_error: RwLock<Option<EngineError>>,
    load_delay: RwLock<Duration>,
    exec_delay: RwLock<Duration>,
    /// Bytes written as the output of conversion commands.
    output_bytes: RwLock<Option<Vec<u8>>>,
    /// Whether conversion commands create their output file.
    produce_output: RwLock<bool>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            logs: LogBus::new(64),
            calls: RwLock::new(Calls::default()),
            exec_logs: RwLock::new(Vec::new()),
            yield_between_lines: RwLock::new(true),
            next_load_error: RwLock::new(None),
            next_exec_error: RwLock::new(None),
            load_delay: RwLock::new(Duration::ZERO),
            exec_delay: RwLock::new(Duration::ZERO),
            output_bytes: RwLock::new(None),
            produce_output: RwLock::new(true),
        }
    }

    /// Set the log lines emitted during every command.
    pub async fn set_exec_logs<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.exec_logs.write().await = lines.into_iter().map(Into::into).collect();
    }

    /// Choose whether commands yield after each line.
    ///
    /// Without yields a command emits all its lines and finishes in a single
    /// poll, so listeners only see them buffered once it has completed.
    pub async fn set_yield_between_lines(&self, yield_between: bool) {
        *self.yield_between_lines.write().await = yield_between;
    }

    /// Configure the next load to fail with the given error.
    pub async fn set_next_load_error(&self, error: EngineError) {
        *self.next_load_error.write().await = Some(error);
    }

    /// Configure the next command to fail with the given error.
    pub async fn set_next_exec_error(&self, error: EngineError) {
        *self.next_exec_error.write().await = Some(error);
    }

    /// Set the simulated load duration.
    pub async fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.write().await = delay;
    }

    /// Set the simulated command duration.
    pub async fn set_exec_delay(&self, delay: Duration) {
        *self.exec_delay.write().await = delay;
    }

    /// Set the bytes produced by conversion commands.
    pub async fn set_output_bytes(&self, bytes: Vec<u8>) {
        *self.output_bytes.write().await = Some(bytes);
    }

    /// Enable or disable creation of output files.
    pub async fn set_produce_output(&self, produce: bool) {
        *self.produce_output.write().await = produce;
    }

    /// Number of load calls.
    pub async fn load_count(&self) -> usize {
        self.calls.read().await.loads
    }

    /// Number of write calls.
    pub async fn write_count(&self) -> usize {
        self.calls.read().await.writes
    }

    /// Number of read calls.
    pub async fn read_count(&self) -> usize {
        self.calls.read().await.reads
    }

    /// Number of commands run.
    pub async fn exec_count(&self) -> usize {
        self.calls.read().await.execs.len()
    }

    /// Number of shutdown calls.
    pub async fn shutdown_count(&self) -> usize {
        self.calls.read().await.shutdowns
    }

    /// Total engine calls of any kind.
    pub async fn call_count(&self) -> usize {
        let calls = self.calls.read().await;
        calls.loads + calls.writes + calls.reads + calls.deletes + calls.execs.len()
    }

    /// Arguments of every command run, in order.
    pub async fn recorded_execs(&self) -> Vec<Vec<String>> {
        self.calls.read().await.execs.clone()
    }

    /// Current content of a virtual file.
    pub async fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(name).cloned()
    }

    /// Names of all virtual files.
    pub async fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live log listeners.
    pub fn subscriber_count(&self) -> usize {
        self.logs.subscriber_count()
    }

    /// Input and output names of a command.
    fn command_files(args: &[String]) -> (Option<String>, Option<String>) {
        let input_pos = args.iter().position(|a| a == "-i").map(|p| p + 1);
        let input = input_pos.and_then(|p| args.get(p)).cloned();
        let output = match input_pos {
            Some(p) if args.len() > p + 1 => args.last().cloned(),
            _ => None,
        };
        (input, output)
    }
}

#[async_trait]
impl TranscoderEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self) -> Result<(), EngineError> {
        self.calls.write().await.loads += 1;

        let delay = *self.load_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_load_error.write().await.take() {
            return Err(err);
        }
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        self.calls.write().await.writes += 1;
        self.files
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.calls.write().await.reads += 1;
        self.files
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::file_not_found(name))
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.calls.write().await.deletes += 1;
        self.files
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::file_not_found(name))
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        self.calls.write().await.execs.push(args.to_vec());

        let delay = *self.exec_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (input, output) = Self::command_files(args);
        let input = input.ok_or_else(|| EngineError::execution("No input specified", None))?;
        if !self.files.read().await.contains_key(&input) {
            let message = format!("{}: No such file or directory", input);
            self.logs.emit(message.clone());
            return Err(EngineError::execution(message, None));
        }

        let lines = self.exec_logs.read().await.clone();
        let yield_between = *self.yield_between_lines.read().await;
        for line in lines {
            self.logs.emit(line);
            if yield_between {
                tokio::task::yield_now().await;
            }
        }

        if let Some(err) = self.next_exec_error.write().await.take() {
            return Err(err);
        }

        let output = match output {
            Some(output) => output,
            None => {
                let message = "At least one output file must be specified";
                self.logs.emit(message);
                return Err(EngineError::execution(message, None));
            }
        };

        if *self.produce_output.read().await {
            let bytes = self
                .output_bytes
                .read()
                .await
                .clone()
                .unwrap_or_else(|| format!("converted:{}", output).into_bytes());
            self.files.write().await.insert(output, bytes);
        }
        Ok(())
    }

    fn subscribe_logs(&self) -> LogSubscription {
        self.logs.subscribe()
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.calls.write().await.shutdowns += 1;
        self.files.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_probe_fails_without_output() {
        let engine = MockEngine::new();
        engine.write_file("a.png", b"png").await.unwrap();
        let err = engine.exec(&args(&["-i", "a.png"])).await.unwrap_err();
        assert!(matches!(err, EngineError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_conversion_produces_output() {
        let engine = MockEngine::new();
        engine.write_file("a.png", b"png").await.unwrap();
        engine
            .exec(&args(&["-i", "a.png", "-y", "a.jpg"]))
            .await
            .unwrap();
        assert_eq!(engine.file("a.jpg").await.unwrap(), b"converted:a.jpg");
        assert_eq!(engine.exec_count().await, 1);
        assert_eq!(engine.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let engine = MockEngine::new();
        let err = engine
            .exec(&args(&["-i", "ghost.mp4", "ghost.mkv"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No such file"));
    }

    #[tokio::test]
    async fn test_scripted_logs_are_emitted() {
        let engine = MockEngine::new();
        engine.set_exec_logs(["one", "two"]).await;
        engine.write_file("a.png", b"png").await.unwrap();

        let mut sub = engine.subscribe_logs();
        let _ = engine.exec(&args(&["-i", "a.png"])).await;
        let lines: Vec<String> = sub.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(
            lines,
            vec!["one", "two", "At least one output file must be specified"]
        );
    }

    #[tokio::test]
    async fn test_command_without_yields_completes_in_one_poll() {
        let engine = MockEngine::new();
        engine.set_yield_between_lines(false).await;
        engine.set_exec_logs(["one", "two"]).await;
        engine.write_file("a.png", b"png").await.unwrap();

        let mut sub = engine.subscribe_logs();
        let args = args(&["-i", "a.png", "a.jpg"]);
        let result = tokio_test::task::spawn(engine.exec(&args)).poll();
        assert!(result.is_ready());
        assert_eq!(sub.drain().len(), 2);
    }
}
