use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use quiz_core::model::{Question, QuestionError, QuestionKind};

use crate::repository::{QuestionRepository, StorageError};

/// Placeholder used in question banks for an empty distractor slot.
pub const NO_DISTRACTOR: &str = "-";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question #{index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<QuestionBankError> for StorageError {
    fn from(err: QuestionBankError) -> Self {
        match err {
            QuestionBankError::Io(io) => StorageError::Io(io),
            other => StorageError::Serialization(other.to_string()),
        }
    }
}

/// One record of a question bank file, using the bank's own field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBankEntry {
    pub subjects: String,
    pub multi_choice: bool,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub wrong_answers: Vec<String>,
}

impl QuestionBankEntry {
    /// Convert to a domain question, dropping placeholder distractors.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the record fails validation.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let wrong_answers = self
            .wrong_answers
            .into_iter()
            .filter(|w| w != NO_DISTRACTOR && !w.trim().is_empty())
            .collect();

        Question::new(
            self.subjects,
            QuestionKind::from_multi_choice(self.multi_choice),
            self.question,
            self.answer,
            wrong_answers,
        )
    }
}

/// Parse a JSON question bank (an array of records).
///
/// Duplicate prompts are kept; they share one ledger entry, which is logged.
///
/// # Errors
///
/// Returns `QuestionBankError::Json` for malformed input or
/// `QuestionBankError::Invalid` for the first record that fails validation.
pub fn parse_question_bank(json: &str) -> Result<Vec<Question>, QuestionBankError> {
    let entries: Vec<QuestionBankEntry> = serde_json::from_str(json)?;

    let mut questions = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let question = entry
            .into_question()
            .map_err(|source| QuestionBankError::Invalid { index, source })?;
        questions.push(question);
    }

    let mut seen = HashSet::new();
    let duplicates = questions
        .iter()
        .filter(|q| !seen.insert(q.prompt()))
        .count();
    if duplicates > 0 {
        tracing::warn!(duplicates, "question bank has repeated prompts; they share review history");
    }

    Ok(questions)
}

/// Question repository backed by a parsed JSON bank.
#[derive(Debug, Clone)]
pub struct JsonQuestionBank {
    questions: Vec<Question>,
}

impl JsonQuestionBank {
    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parse a bank from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`parse_question_bank`].
    pub fn from_json(json: &str) -> Result<Self, QuestionBankError> {
        Ok(Self::from_questions(parse_question_bank(json)?))
    }

    /// Read and parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Io` if the file cannot be read, otherwise see
    /// [`parse_question_bank`].
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let bank = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionRepository for JsonQuestionBank {
    async fn list_all(&self) -> Result<Vec<Question>, StorageError> {
        Ok(self.questions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: &str = r#"[
        {
            "subjects": "Doors",
            "multi_choice": true,
            "question": "How many doors on the main deck?",
            "answer": "8",
            "wrong_answers": ["6", "-", "10", "-"]
        },
        {
            "subjects": "Engines",
            "multi_choice": false,
            "question": "Engine manufacturer?",
            "answer": "Rolls-Royce",
            "wrong_answers": ["-", "-", "-"]
        }
    ]"#;

    #[test]
    fn parses_bank_and_strips_placeholders() {
        let questions = parse_question_bank(BANK).unwrap();
        assert_eq!(questions.len(), 2);

        let doors = &questions[0];
        assert!(doors.is_multiple_choice());
        assert_eq!(doors.wrong_answers(), ["6", "10"]);
        assert!(!doors.choices().iter().any(|c| c == NO_DISTRACTOR));

        let engines = &questions[1];
        assert_eq!(engines.kind(), QuestionKind::FreeText);
        assert!(engines.wrong_answers().is_empty());
    }

    #[test]
    fn missing_wrong_answers_defaults_to_empty() {
        let json = r#"[{"subjects":"S","multi_choice":false,"question":"Q","answer":"A"}]"#;
        let questions = parse_question_bank(json).unwrap();
        assert!(questions[0].wrong_answers().is_empty());
    }

    #[test]
    fn invalid_record_reports_index() {
        let json = r#"[
            {"subjects":"S","multi_choice":false,"question":"Q","answer":"A","wrong_answers":[]},
            {"subjects":"S","multi_choice":false,"question":"Q2","answer":" ","wrong_answers":[]}
        ]"#;
        let err = parse_question_bank(json).unwrap_err();
        assert!(matches!(
            err,
            QuestionBankError::Invalid { index: 1, source: QuestionError::EmptyAnswer }
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_question_bank("{}"),
            Err(QuestionBankError::Json(_))
        ));
    }

    #[test]
    fn entry_field_names_match_bank_format() {
        let entry = QuestionBankEntry {
            subjects: "S".into(),
            multi_choice: true,
            question: "Q".into(),
            answer: "A".into(),
            wrong_answers: vec!["-".into()],
        };
        let value = serde_json::to_value(&entry).unwrap();
        for field in ["subjects", "multi_choice", "question", "answer", "wrong_answers"] {
            assert!(value.get(field).is_some(), "{field}");
        }
    }

    #[tokio::test]
    async fn bank_serves_questions_and_subjects() {
        let bank = JsonQuestionBank::from_json(BANK).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(
            bank.list_subjects().await.unwrap(),
            vec!["Doors", "Engines"]
        );
    }

    #[tokio::test]
    async fn bank_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        tokio::fs::write(&path, BANK).await.unwrap();

        let bank = JsonQuestionBank::from_path(&path).await.unwrap();
        assert_eq!(bank.list_all().await.unwrap().len(), 2);

        let missing = JsonQuestionBank::from_path(dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(QuestionBankError::Io(_))));
    }
}
