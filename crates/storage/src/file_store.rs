use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::repository::{KeyValueStore, StorageError};

/// Key-value store keeping each key in its own JSON file under `dir`.
///
/// Writes land in a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the key is empty or contains
    /// characters outside `[A-Za-z0-9._-]`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::Serialization(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LEDGER_KEY, ReviewLedger};
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        assert_eq!(store.read(LEDGER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_creates_dir_and_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));

        store.write(LEDGER_KEY, "{}").await.unwrap();
        store.write(LEDGER_KEY, "[1]").await.unwrap();

        assert_eq!(store.read(LEDGER_KEY).await.unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("nested/review-data.json").exists());
        assert!(!dir.path().join("nested/review-data.json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let store = JsonFileStore::new("/tmp/unused");
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.path_for(key),
                Err(StorageError::Serialization(_))
            ));
        }
        assert!(store.path_for("review-data").is_ok());
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.write(LEDGER_KEY, "garbage").await.unwrap();

        let ledger = ReviewLedger::new(Arc::new(store));
        assert!(ledger.load().await.is_empty());
    }
}
