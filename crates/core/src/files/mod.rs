//! Files selected in a session and their lifecycle.
//!
//! A [`FileRecord`] is created when a file is selected, gains its source
//! type and targets after detection, its result bytes after conversion,
//! and is dropped when removed from the [`FileRegistry`].

mod error;
mod record;
mod registry;

pub use error::FileError;
pub use record::{normalize_extension, FileRecord, FileStatus, FileSummary};
pub use registry::{FileRegistry, SharedRecord};
