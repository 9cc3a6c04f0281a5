//! In-memory set of files selected during one session.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::error::FileError;
use super::record::{FileRecord, FileSummary};
use crate::config::FilesConfig;

/// Shared handle to one record. Detection and conversion hold the lock for
/// their whole run.
pub type SharedRecord = Arc<Mutex<FileRecord>>;

/// Files in flight, unique by name, kept in selection order.
pub struct FileRegistry {
    entries: RwLock<Vec<(String, SharedRecord)>>,
    config: FilesConfig,
}

impl FileRegistry {
    pub fn new(config: FilesConfig) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Adds a freshly selected file.
    pub async fn add(&self, name: &str, data: Vec<u8>) -> Result<SharedRecord, FileError> {
        if !is_valid_name(name) {
            return Err(FileError::InvalidName {
                name: name.to_string(),
            });
        }

        let size_bytes = data.len() as u64;
        if size_bytes > self.config.max_upload_bytes {
            return Err(FileError::TooLarge {
                size_bytes,
                max_bytes: self.config.max_upload_bytes,
            });
        }

        let mut entries = self.entries.write().await;
        if entries.iter().any(|(n, _)| n == name) {
            return Err(FileError::Duplicate {
                name: name.to_string(),
            });
        }

        let record = Arc::new(Mutex::new(FileRecord::new(
            name,
            data,
            self.config.display_name_max_len,
        )));
        entries.push((name.to_string(), Arc::clone(&record)));
        tracing::debug!(file = name, size_bytes, "File added to session");
        Ok(record)
    }

    pub async fn get(&self, name: &str) -> Result<SharedRecord, FileError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, record)| Arc::clone(record))
            .ok_or_else(|| FileError::not_found(name))
    }

    /// Removes a file from the session and hands back its record.
    pub async fn remove(&self, name: &str) -> Result<SharedRecord, FileError> {
        let mut entries = self.entries.write().await;
        let pos = entries
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| FileError::not_found(name))?;
        let (_, record) = entries.remove(pos);
        tracing::debug!(file = name, "File removed from session");
        Ok(record)
    }

    /// All records in selection order.
    pub async fn list(&self) -> Vec<SharedRecord> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(_, record)| Arc::clone(record))
            .collect()
    }

    /// Summaries of all records in selection order.
    pub async fn summaries(&self) -> Vec<FileSummary> {
        let records = self.list().await;
        futures::future::join_all(
            records
                .iter()
                .map(|record| async move { record.lock().await.summary() }),
        )
        .await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Names double as virtual filenames: one path component, not an option.
fn is_valid_name(name: &str) -> bool {
    !(name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('-')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn registry() -> FileRegistry {
        FileRegistry::new(FilesConfig {
            max_upload_bytes: 16,
            display_name_max_len: 32,
        })
    }

    #[tokio::test]
    async fn test_add_get_remove() {
        let registry = registry();
        assert_ok!(registry.add("a.png", vec![1, 2]).await);
        assert_ok!(registry.add("b.wav", vec![3]).await);
        assert_eq!(registry.len().await, 2);

        let record = registry.get("b.wav").await.unwrap();
        assert_eq!(record.lock().await.size_bytes, 1);

        registry.remove("a.png").await.unwrap();
        assert!(matches!(
            registry.get("a.png").await,
            Err(FileError::NotFound { .. })
        ));
        assert!(matches!(
            registry.remove("a.png").await,
            Err(FileError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let registry = registry();
        registry.add("clip.mov", vec![]).await.unwrap();
        let err = registry.add("clip.mov", vec![]).await.unwrap_err();
        assert!(matches!(err, FileError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_rejects_bad_names_and_large_files() {
        let registry = registry();
        for name in ["", "  ", "../x.png", "dir/x.png", "-y", ".."] {
            assert!(matches!(
                registry.add(name, vec![]).await,
                Err(FileError::InvalidName { .. })
            ));
        }
        assert!(matches!(
            registry.add("big.mp4", vec![0; 17]).await,
            Err(FileError::TooLarge {
                size_bytes: 17,
                max_bytes: 16
            })
        ));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_summaries_keep_selection_order() {
        let registry = registry();
        for name in ["c.mp3", "a.png", "b.mkv"] {
            registry.add(name, vec![]).await.unwrap();
        }
        let names: Vec<String> = registry
            .summaries()
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["c.mp3", "a.png", "b.mkv"]);
    }
}
