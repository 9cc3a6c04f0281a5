//! The per-file model carried through detection, conversion and export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::converter::ConvertError;
use crate::formats::{possible_targets, FormatCatalog, MediaFamily};

/// Where a file is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileStatus {
    /// Added to the session, not probed yet.
    Selected,
    /// Probed; source type and targets are settled.
    Detected,
    /// A conversion is running.
    Converting,
    /// Result bytes are available.
    Converted,
    /// The last conversion failed.
    Failed { reason: String },
}

/// One user-selected file in flight.
///
/// Fields are read through accessors and changed only by the methods below,
/// which keep the invariants:
/// `target_type` is one of `available_targets` whenever set, `result_bytes`
/// is present exactly when the status is `Converted`, and `source_type` is
/// lower-case without a leading dot.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Original filename, unique per session.
    pub(crate) name: String,
    /// Name shortened for display.
    pub(crate) display_name: String,
    pub(crate) name_without_extension: String,
    /// Extension taken from the filename, normalized.
    pub(crate) declared_type: Option<String>,
    pub(crate) size_bytes: u64,
    /// Detected or declared extension.
    pub(crate) source_type: Option<String>,
    /// Whether a probe has completed for this file.
    pub(crate) probed: bool,
    /// Codec reported by the last probe, if any.
    pub(crate) detected_codec: Option<String>,
    pub(crate) target_type: Option<String>,
    pub(crate) available_targets: Vec<String>,
    pub(crate) status: FileStatus,
    /// 0-100.
    pub(crate) progress: u8,
    pub(crate) result_bytes: Option<Vec<u8>>,
    pub(crate) raw_data: Vec<u8>,
    pub(crate) added_at: DateTime<Utc>,
}

impl FileRecord {
    /// Original filename, unique per session.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn name_without_extension(&self) -> &str {
        &self.name_without_extension
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Detected or declared extension.
    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    pub fn is_probed(&self) -> bool {
        self.probed
    }

    pub fn detected_codec(&self) -> Option<&str> {
        self.detected_codec.as_deref()
    }

    pub fn target_type(&self) -> Option<&str> {
        self.target_type.as_deref()
    }

    pub fn available_targets(&self) -> &[String] {
        &self.available_targets
    }

    pub fn status(&self) -> &FileStatus {
        &self.status
    }

    /// 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Converted bytes, present only while the status is `Converted`.
    pub fn result_bytes(&self) -> Option<&[u8]> {
        self.result_bytes.as_deref()
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Creates a record for a freshly selected file.
    pub fn new(name: impl Into<String>, raw_data: Vec<u8>, display_name_max_len: usize) -> Self {
        let name = name.into();
        let (stem, ext) = split_name(&name);
        let declared_type = ext.map(normalize_extension).filter(|e| !e.is_empty());
        let available_targets = possible_targets(declared_type.as_deref().unwrap_or(""));

        Self {
            display_name: truncate_display_name(&name, display_name_max_len),
            name_without_extension: stem.to_string(),
            size_bytes: raw_data.len() as u64,
            source_type: declared_type.clone(),
            declared_type,
            probed: false,
            detected_codec: None,
            target_type: None,
            available_targets,
            status: FileStatus::Selected,
            progress: 0,
            result_bytes: None,
            raw_data,
            added_at: Utc::now(),
            name,
        }
    }

    /// Sets the source type and recomputes the valid targets. A chosen
    /// target that is no longer valid is cleared.
    pub fn set_source_type(&mut self, source: &str) {
        let source = normalize_extension(source);
        self.available_targets = possible_targets(&source);
        self.source_type = if source.is_empty() { None } else { Some(source) };

        if let Some(target) = &self.target_type {
            if !self.available_targets.contains(target) {
                self.target_type = None;
            }
        }
    }

    /// Records the outcome of a probe.
    ///
    /// A detected codec that names a known extension wins. Otherwise a known
    /// declared extension is kept, and failing that whatever is available
    /// is used as-is.
    pub fn apply_detection(&mut self, detected: Option<&str>) {
        let detected = detected.map(normalize_extension).filter(|d| !d.is_empty());
        let declared = self.declared_type.clone();

        let source = match (&detected, &declared) {
            (Some(d), _) if FormatCatalog::is_known(d) => Some(d.clone()),
            (_, Some(d)) if FormatCatalog::is_known(d) => Some(d.clone()),
            (Some(d), _) => Some(d.clone()),
            (None, d) => d.clone(),
        };

        self.probed = true;
        self.detected_codec = detected;
        self.set_source_type(source.as_deref().unwrap_or(""));
        self.result_bytes = None;
        self.progress = 0;
        self.status = FileStatus::Detected;
    }

    /// Chooses the conversion target.
    ///
    /// Choosing a different target drops any previous result.
    pub fn select_target(&mut self, target: &str) -> Result<(), ConvertError> {
        let target = normalize_extension(target);
        if !self.available_targets.contains(&target) {
            return Err(ConvertError::UnsupportedTarget {
                target,
                available: self.available_targets.clone(),
            });
        }

        if self.target_type.as_deref() == Some(target.as_str()) {
            return Ok(());
        }

        self.target_type = Some(target);
        if matches!(
            self.status,
            FileStatus::Converted | FileStatus::Failed { .. }
        ) {
            self.result_bytes = None;
            self.progress = 0;
            self.status = self.idle_status();
        }
        Ok(())
    }

    /// Whether the chosen target is currently valid.
    pub fn has_valid_target(&self) -> bool {
        self.target_type
            .as_ref()
            .is_some_and(|t| self.available_targets.contains(t))
    }

    /// Family of the chosen target.
    pub fn target_family(&self) -> Option<MediaFamily> {
        self.target_type.as_deref().and_then(FormatCatalog::family_of)
    }

    /// `<name_without_extension>.<target_type>`.
    pub fn output_name(&self) -> Option<String> {
        self.target_type
            .as_ref()
            .map(|target| format!("{}.{}", self.name_without_extension, target))
    }

    pub fn begin_conversion(&mut self) {
        self.result_bytes = None;
        self.progress = 0;
        self.status = FileStatus::Converting;
    }

    pub fn set_progress(&mut self, percent: f32) {
        self.progress = percent.clamp(0.0, 100.0) as u8;
    }

    pub fn mark_converted(&mut self, bytes: Vec<u8>) {
        self.result_bytes = Some(bytes);
        self.progress = 100;
        self.status = FileStatus::Converted;
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.result_bytes = None;
        self.progress = 0;
        self.status = FileStatus::Failed {
            reason: reason.into(),
        };
    }

    /// Returns a failed or interrupted record to its resting state.
    pub fn reset_status(&mut self) {
        self.result_bytes = None;
        self.progress = 0;
        self.status = self.idle_status();
    }

    fn idle_status(&self) -> FileStatus {
        if self.probed {
            FileStatus::Detected
        } else {
            FileStatus::Selected
        }
    }

    /// Serializable view without the byte buffers.
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            name_without_extension: self.name_without_extension.clone(),
            size_bytes: self.size_bytes,
            source_type: self.source_type.clone(),
            detected_codec: self.detected_codec.clone(),
            target_type: self.target_type.clone(),
            available_targets: self.available_targets.clone(),
            status: self.status.clone(),
            progress: self.progress,
            result_size_bytes: self.result_bytes.as_ref().map(|b| b.len() as u64),
            added_at: self.added_at,
        }
    }
}

/// API view of a [`FileRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub display_name: String,
    pub name_without_extension: String,
    pub size_bytes: u64,
    pub source_type: Option<String>,
    pub detected_codec: Option<String>,
    pub target_type: Option<String>,
    pub available_targets: Vec<String>,
    pub status: FileStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size_bytes: Option<u64>,
    pub added_at: DateTime<Utc>,
}

/// Lower-case, no leading dot, no surrounding whitespace.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Splits `clip.final.mov` into (`clip.final`, Some(`mov`)). Dotfiles and
/// names ending in a dot have no extension.
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Shortens long names to `<prefix>...<.ext>` within `max_len` characters.
fn truncate_display_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let suffix = match split_name(name).1 {
        Some(ext) => format!("....{}", ext),
        None => "...".to_string(),
    };
    let suffix_len = suffix.chars().count();
    if suffix_len >= max_len {
        return name.chars().take(max_len).collect();
    }

    let prefix: String = name.chars().take(max_len - suffix_len).collect();
    format!("{}{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_derives_names_and_targets() {
        let record = FileRecord::new("clip.MOV", vec![1, 2, 3], 32);
        assert_eq!(record.name_without_extension, "clip");
        assert_eq!(record.declared_type.as_deref(), Some("mov"));
        assert_eq!(record.source_type.as_deref(), Some("mov"));
        assert_eq!(record.size_bytes, 3);
        assert_eq!(record.status, FileStatus::Selected);
        assert_eq!(
            record.available_targets,
            vec!["mp4", "avi", "mkv", "flv", "webm", "wmv", "mpeg"]
        );
        assert!(record.result_bytes.is_none());
    }

    #[test]
    fn test_split_name_edge_cases() {
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_name(".bashrc"), (".bashrc", None));
        assert_eq!(split_name("README"), ("README", None));
        assert_eq!(split_name("trailing."), ("trailing.", None));
    }

    #[test]
    fn test_record_without_extension_offers_everything() {
        let record = FileRecord::new("recording", vec![], 32);
        assert!(record.source_type.is_none());
        assert_eq!(record.available_targets.len(), 22);
    }

    #[test]
    fn test_display_name_truncation() {
        assert_eq!(truncate_display_name("short.mp4", 20), "short.mp4");
        let truncated = truncate_display_name("a_very_long_file_name_for_testing.mp4", 20);
        assert_eq!(truncated, "a_very_long_f....mp4");
        assert_eq!(truncated.chars().count(), 20);

        let unicode = truncate_display_name("ビデオファイルの名前がとても長い.webm", 12);
        assert_eq!(unicode.chars().count(), 12);
        assert!(unicode.ends_with("....webm"));
    }

    #[test]
    fn test_source_type_is_normalized() {
        let mut record = FileRecord::new("clip.mov", vec![], 32);
        record.set_source_type(".PNG");
        assert_eq!(record.source_type.as_deref(), Some("png"));
        assert!(!record.available_targets.contains(&"png".to_string()));
    }

    #[test]
    fn test_apply_detection_prefers_known_codec() {
        let mut record = FileRecord::new("picture.jpg", vec![], 32);
        record.apply_detection(Some("PNG"));
        assert_eq!(record.source_type.as_deref(), Some("png"));
        assert_eq!(record.detected_codec.as_deref(), Some("png"));
        assert_eq!(record.status, FileStatus::Detected);
    }

    #[test]
    fn test_apply_detection_keeps_known_declared_type() {
        let mut record = FileRecord::new("clip.mov", vec![], 32);
        record.apply_detection(Some("h264"));
        assert_eq!(record.source_type.as_deref(), Some("mov"));
        assert_eq!(record.detected_codec.as_deref(), Some("h264"));

        record.apply_detection(None);
        assert_eq!(record.source_type.as_deref(), Some("mov"));
        assert!(record.detected_codec.is_none());
    }

    #[test]
    fn test_apply_detection_unknown_everything() {
        let mut record = FileRecord::new("blob.bin", vec![], 32);
        record.apply_detection(Some("prores"));
        assert_eq!(record.source_type.as_deref(), Some("prores"));
        assert_eq!(record.available_targets.len(), 22);
    }

    #[test]
    fn test_detection_clears_invalid_target() {
        let mut record = FileRecord::new("file.bin", vec![], 32);
        record.select_target("png").unwrap();
        record.apply_detection(Some("png"));
        assert!(record.target_type.is_none());
    }

    #[test]
    fn test_select_target_validates() {
        let mut record = FileRecord::new("song.wav", vec![], 32);
        let err = record.select_target("mp4").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedTarget { .. }));
        assert!(record.target_type.is_none());

        record.select_target(".MP3").unwrap();
        assert_eq!(record.target_type.as_deref(), Some("mp3"));
        assert_eq!(record.output_name().as_deref(), Some("song.mp3"));
        assert_eq!(record.target_family(), Some(MediaFamily::Audio));
    }

    #[test]
    fn test_retarget_drops_result() {
        let mut record = FileRecord::new("song.wav", vec![], 32);
        record.apply_detection(Some("pcm_s16le"));
        record.select_target("mp3").unwrap();
        record.begin_conversion();
        record.mark_converted(vec![9, 9]);
        assert_eq!(record.status, FileStatus::Converted);
        assert_eq!(record.progress, 100);

        // Same target keeps the result.
        record.select_target("mp3").unwrap();
        assert!(record.result_bytes.is_some());

        record.select_target("flac").unwrap();
        assert!(record.result_bytes.is_none());
        assert_eq!(record.status, FileStatus::Detected);
    }

    #[test]
    fn test_failure_clears_result() {
        let mut record = FileRecord::new("a.png", vec![], 32);
        record.select_target("jpg").unwrap();
        record.mark_converted(vec![1]);
        record.mark_failed("boom");
        assert!(record.result_bytes.is_none());
        assert_eq!(
            record.status,
            FileStatus::Failed {
                reason: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_summary_serializes_status_tag() {
        let record = FileRecord::new("a.png", vec![0; 10], 32);
        let json = serde_json::to_value(record.summary()).unwrap();
        assert_eq!(json["status"]["type"], "selected");
        assert_eq!(json["size_bytes"], 10);
        assert!(json.get("result_size_bytes").is_none());
    }
}
