//! Export of converted files as downloads.

mod content_type;
mod error;
mod writer;

pub use content_type::{content_type_for, OCTET_STREAM};
pub use error::ExportError;
pub use writer::{DownloadHandle, ExportWriter};
