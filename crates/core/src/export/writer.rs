//! Turns converted records into downloadable payloads.

use tracing::debug;

use super::content_type::content_type_for;
use super::error::ExportError;
use crate::files::FileRecord;

/// A converted file ready to hand to the host's save facility.
///
/// Owns a copy of the result bytes; the host consumes it with
/// [`into_parts`](Self::into_parts) once the save is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadHandle {
    /// `attachment; filename="<file_name>"`, with quotes and backslashes escaped.
    pub fn content_disposition(&self) -> String {
        let escaped = self.file_name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("attachment; filename=\"{}\"", escaped)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Releases the handle into (file name, content type, bytes).
    pub fn into_parts(self) -> (String, &'static str, Vec<u8>) {
        (self.file_name, self.content_type, self.bytes)
    }
}

/// Prepares downloads for converted files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportWriter;

impl ExportWriter {
    pub fn new() -> Self {
        Self
    }

    /// Builds the download for `file`'s result. Fails with `NoResultData`
    /// before a successful conversion.
    pub fn prepare_download(&self, file: &FileRecord) -> Result<DownloadHandle, ExportError> {
        let no_result = || ExportError::NoResultData {
            name: file.name.clone(),
        };
        let bytes = file.result_bytes.as_ref().ok_or_else(no_result)?;
        let file_name = file.output_name().ok_or_else(no_result)?;
        let content_type = content_type_for(file.target_type.as_deref().unwrap_or_default());

        debug!(
            file = %file.name,
            download = %file_name,
            content_type,
            bytes = bytes.len(),
            "Prepared download"
        );

        Ok(DownloadHandle {
            file_name,
            content_type,
            bytes: bytes.clone(),
        })
    }
}
