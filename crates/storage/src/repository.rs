use async_trait::async_trait;
use quiz_core::model::Question;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single-slot-per-key blob store.
///
/// Values are replaced whole on every write; there is no partial update.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    /// A missing key is `Ok(None)`, not an error.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Source of question records for quiz runs.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Every question in the bank, in bank order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be loaded.
    async fn list_all(&self) -> Result<Vec<Question>, StorageError>;

    /// Distinct subjects, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be loaded.
    async fn list_subjects(&self) -> Result<Vec<String>, StorageError> {
        let questions = self.list_all().await?;
        Ok(subjects_of(&questions))
    }
}

/// Sorted distinct subjects of `questions`.
#[must_use]
pub fn subjects_of(questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .map(|q| q.subject().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a raw value, bypassing any serialization.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.into());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert_raw(key, value)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_all(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

/// Aggregates the question source and the blob store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { questions, kv }
    }

    #[must_use]
    pub fn in_memory(questions: Vec<Question>) -> Self {
        let repo = InMemoryRepository::with_questions(questions);
        let kv: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self { questions, kv }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionKind;

    fn question(subject: &str, prompt: &str) -> Question {
        Question::new(subject, QuestionKind::FreeText, prompt, "A", Vec::new()).unwrap()
    }

    #[tokio::test]
    async fn subjects_are_sorted_and_distinct() {
        let repo = InMemoryRepository::with_questions(vec![
            question("Hydraulics", "Q1"),
            question("Doors", "Q2"),
            question("Hydraulics", "Q3"),
        ]);

        let subjects = repo.list_subjects().await.unwrap();
        assert_eq!(subjects, vec!["Doors", "Hydraulics"]);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn slots_round_trip_and_replace() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.read("review-data").await.unwrap(), None);

        repo.write("review-data", "{}").await.unwrap();
        repo.write("review-data", r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            repo.read("review-data").await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[tokio::test]
    async fn storage_in_memory_shares_one_repository() {
        let storage = Storage::in_memory(vec![question("Doors", "Q")]);
        storage.kv.write("k", "v").await.unwrap();
        assert_eq!(storage.kv.read("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(storage.questions.list_all().await.unwrap().len(), 1);
    }
}
