//! Static classification of media extensions into families.
//!
//! The catalog decides which target extensions are offered for a given
//! source: members of the same family, or everything when the source is
//! unknown.

mod catalog;
mod types;

pub use catalog::{possible_targets, FormatCatalog, AUDIO_FORMATS, IMAGE_FORMATS, VIDEO_FORMATS};
pub use types::MediaFamily;
