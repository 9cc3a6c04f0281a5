//! Content types for catalog extensions.

/// Fallback for extensions without a known content type.
pub const OCTET_STREAM: &str = "application/octet-stream";

const CONTENT_TYPES: &[(&str, &str)] = &[
    // video
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("flv", "video/x-flv"),
    ("webm", "video/webm"),
    ("wmv", "video/x-ms-wmv"),
    ("mpeg", "video/mpeg"),
    // audio
    ("mp3", "audio/mpeg"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("wma", "audio/x-ms-wma"),
    // image
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
];

/// Content type for an extension, case-insensitive.
pub fn content_type_for(ext: &str) -> &'static str {
    let ext = crate::files::normalize_extension(ext);
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map_or(OCTET_STREAM, |(_, content_type)| content_type)
}
