use std::sync::Arc;
use std::time::Duration;
use transmute_core::{
    Config, ConversionOrchestrator, EngineSession, ExportWriter, FileRegistry, FormatSniffer,
    TranscoderEngine,
};

/// Shared application state
pub struct AppState {
    config: Config,
    session: Arc<EngineSession>,
    sniffer: FormatSniffer,
    orchestrator: ConversionOrchestrator,
    exporter: ExportWriter,
    files: FileRegistry,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<dyn TranscoderEngine>) -> Self {
        let session = Arc::new(EngineSession::new(
            engine,
            Duration::from_secs(config.engine.exec_timeout_secs),
        ));

        Self {
            sniffer: FormatSniffer::new(Arc::clone(&session)),
            orchestrator: ConversionOrchestrator::new(
                Arc::clone(&session),
                config.conversion.clone(),
            ),
            exporter: ExportWriter::new(),
            files: FileRegistry::new(config.files.clone()),
            session,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn sniffer(&self) -> &FormatSniffer {
        &self.sniffer
    }

    pub fn orchestrator(&self) -> &ConversionOrchestrator {
        &self.orchestrator
    }

    pub fn exporter(&self) -> &ExportWriter {
        &self.exporter
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }
}
