//! Known extensions per family and target computation.

use super::types::MediaFamily;

/// Video container extensions, in offer order.
pub const VIDEO_FORMATS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "webm", "wmv", "mpeg"];

/// Audio extensions, in offer order.
pub const AUDIO_FORMATS: &[&str] = &["mp3", "aac", "wav", "flac", "ogg", "m4a", "wma"];

/// Image extensions, in offer order.
pub const IMAGE_FORMATS: &[&str] = &["jpeg", "jpg", "png", "gif", "bmp", "tiff", "webp"];

/// Lookup over the static family lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatCatalog;

impl FormatCatalog {
    /// Extensions belonging to a family.
    pub fn members(family: MediaFamily) -> &'static [&'static str] {
        match family {
            MediaFamily::Video => VIDEO_FORMATS,
            MediaFamily::Audio => AUDIO_FORMATS,
            MediaFamily::Image => IMAGE_FORMATS,
        }
    }

    /// Family of an extension, case-insensitive. Video wins over audio,
    /// audio over image.
    pub fn family_of(ext: &str) -> Option<MediaFamily> {
        let ext = ext.to_lowercase();
        MediaFamily::ALL
            .into_iter()
            .find(|family| Self::members(*family).contains(&ext.as_str()))
    }

    /// Whether the extension is listed in any family.
    pub fn is_known(ext: &str) -> bool {
        Self::family_of(ext).is_some()
    }

    /// Every known extension: video, then audio, then image.
    pub fn all() -> Vec<String> {
        MediaFamily::ALL
            .into_iter()
            .flat_map(|family| Self::members(family).iter())
            .map(|ext| ext.to_string())
            .collect()
    }
}

/// Valid target extensions for a source extension.
///
/// Known sources get the rest of their family in declared order. Unknown
/// sources get every known extension.
pub fn possible_targets(source_ext: &str) -> Vec<String> {
    let source = source_ext.to_lowercase();

    match FormatCatalog::family_of(&source) {
        Some(family) => FormatCatalog::members(family)
            .iter()
            .filter(|ext| **ext != source)
            .map(|ext| ext.to_string())
            .collect(),
        None => FormatCatalog::all(),
    }
}
