pub mod config;
pub mod converter;
pub mod engine;
pub mod export;
pub mod files;
pub mod formats;
pub mod metrics;
pub mod sniffer;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, FilesConfig, ServerConfig,
};
pub use converter::{
    ConversionCommand, ConversionOrchestrator, ConversionProfiles, ConversionProgress, ConvertError,
    ProgressTracker,
};
pub use engine::{
    EngineConfig, EngineError, EngineSession, FfmpegEngine, SessionState, TranscoderEngine,
};
pub use export::{content_type_for, DownloadHandle, ExportError, ExportWriter};
pub use files::{FileError, FileRecord, FileRegistry, FileStatus, FileSummary, SharedRecord};
pub use formats::{possible_targets, FormatCatalog, MediaFamily};
pub use sniffer::{FormatSniffer, LogFormatParser, StreamInfoParser};
