//! Durable mapping from question identity to SM-2 review state.
//!
//! The whole `ReviewMap` is stored as one JSON blob in a single key-value
//! slot. Reads never fail: an absent, unreadable or undecodable slot is a
//! cold start and yields an empty map.

use std::sync::Arc;

use quiz_core::model::{QuestionId, ReviewMap, ReviewRecord};

use crate::repository::{KeyValueStore, StorageError};

/// Slot the ledger lives under unless overridden.
pub const LEDGER_KEY: &str = "review-data";

#[derive(Clone)]
pub struct ReviewLedger {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ReviewLedger {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, LEDGER_KEY)
    }

    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the full mapping, treating any failure as "no history".
    pub async fn load(&self) -> ReviewMap {
        let raw = match self.store.read(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ReviewMap::new(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "review ledger unreadable, starting cold");
                return ReviewMap::new();
            }
        };

        match serde_json::from_str::<ReviewMap>(&raw) {
            Ok(map) => {
                tracing::debug!(key = %self.key, entries = map.len(), "review ledger loaded");
                map
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "review ledger corrupt, starting cold");
                ReviewMap::new()
            }
        }
    }

    /// Replace the stored mapping.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the map cannot be encoded, or
    /// the store's error if the write fails.
    pub async fn save(&self, reviews: &ReviewMap) -> Result<(), StorageError> {
        let raw = serde_json::to_string(reviews)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.write(&self.key, &raw).await
    }

    /// Review record for one question, if it was ever graded.
    pub async fn get(&self, id: &QuestionId) -> Option<ReviewRecord> {
        self.load().await.remove(id)
    }
}

impl std::fmt::Debug for ReviewLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewLedger")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use async_trait::async_trait;
    use quiz_core::model::ReviewQuality;
    use quiz_core::scheduler::Scheduler;
    use quiz_core::time::fixed_now;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("disk on fire".into()))
        }

        async fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk on fire".into()))
        }
    }

    fn graded(prompt: &str) -> ReviewRecord {
        let id = QuestionId::new(prompt);
        Scheduler::new().grade(None, &id, ReviewQuality::Good, fixed_now())
    }

    #[tokio::test]
    async fn empty_store_is_cold_start() {
        let ledger = ReviewLedger::new(Arc::new(InMemoryRepository::new()));
        assert!(ledger.load().await.is_empty());
        assert_eq!(ledger.get(&QuestionId::new("Q")).await, None);
    }

    #[tokio::test]
    async fn save_then_load_returns_same_map() {
        let repo = InMemoryRepository::new();
        let ledger = ReviewLedger::new(Arc::new(repo.clone()));

        let mut map = ReviewMap::new();
        for prompt in ["Q1", "Q2"] {
            let record = graded(prompt);
            map.insert(record.question_id.clone(), record);
        }
        ledger.save(&map).await.unwrap();

        assert_eq!(ledger.load().await, map);
        assert_eq!(ledger.get(&QuestionId::new("Q2")).await, Some(graded("Q2")));
        assert!(repo.read(LEDGER_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_blob_is_cold_start() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(LEDGER_KEY, "{ not json").unwrap();
        let ledger = ReviewLedger::new(Arc::new(repo.clone()));
        assert!(ledger.load().await.is_empty());

        repo.insert_raw(LEDGER_KEY, r#"{"Q":{"questionId":"Q"}}"#).unwrap();
        assert!(ledger.load().await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_store_is_cold_start_and_write_errors_surface() {
        let ledger = ReviewLedger::new(Arc::new(BrokenStore));
        assert!(ledger.load().await.is_empty());

        let err = ledger.save(&ReviewMap::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn custom_key_is_isolated() {
        let repo = InMemoryRepository::new();
        let a = ReviewLedger::new(Arc::new(repo.clone()));
        let b = ReviewLedger::with_key(Arc::new(repo.clone()), "other");

        let record = graded("Q");
        let mut map = ReviewMap::new();
        map.insert(record.question_id.clone(), record);
        a.save(&map).await.unwrap();

        assert_eq!(b.key(), "other");
        assert!(b.load().await.is_empty());
        assert_eq!(a.load().await.len(), 1);
    }
}
