use thiserror::Error;

/// Errors raised while preparing a download.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file has not been converted yet.
    #[error("No converted data for {name}; convert the file first")]
    NoResultData { name: String },
}
