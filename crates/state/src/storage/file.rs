//! File-backed key-value store.
//!
//! Persists all entries as a single JSON document. Writes go through a
//! temporary file followed by an atomic rename so a crash mid-write never
//! leaves a truncated document behind.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] persisting to a single JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    // Serializes read-modify-write cycles against the same file.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file is created lazily on first write; a missing file reads as
    /// an empty store.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read(&self.inner.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StorageError::Corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(entries).map_err(StorageError::Corrupt)?;
        let tmp = self.inner.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.inner.path).await?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.inner.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.inner.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.inner.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tiffin-store-{name}-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert!(store.get("token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_survives_reopen() {
        let path = temp_path("reopen");
        let store = JsonFileStore::new(path.clone());
        store.set("cartItems", "[]").await.unwrap();
        store.set("restaurant", "r-9").await.unwrap();

        let reopened = JsonFileStore::new(path.clone());
        assert_eq!(
            reopened.get("restaurant").await.unwrap().as_deref(),
            Some("r-9")
        );
        assert_eq!(
            reopened.get("cartItems").await.unwrap().as_deref(),
            Some("[]")
        );

        let _ = tokio::fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, b"not-json").await.unwrap();
        let store = JsonFileStore::new(path.clone());
        let err = store.get("token").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
        let _ = tokio::fs::remove_file(path).await;
    }
}
