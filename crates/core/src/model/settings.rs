use thiserror::Error;

/// Number of questions in a run when the learner does not choose.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("subject filter cannot be blank")]
    BlankSubject,
}

/// Where a quiz run draws its questions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Uniform sample of the (filtered) bank.
    #[default]
    Random,
    /// Overdue and never-reviewed questions only.
    Due,
}

/// Per-run quiz configuration chosen before a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    subject: Option<String>,
    question_count: u32,
    mode: SelectionMode,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            subject: None,
            question_count: DEFAULT_QUESTION_COUNT,
            mode: SelectionMode::Random,
        }
    }
}

impl QuizSettings {
    /// Creates settings for a run.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionCount` if `question_count` is zero,
    /// or `SettingsError::BlankSubject` if a subject filter is whitespace only.
    pub fn new(
        subject: Option<String>,
        question_count: u32,
        mode: SelectionMode,
    ) -> Result<Self, SettingsError> {
        if question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        if subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SettingsError::BlankSubject);
        }
        Ok(Self {
            subject,
            question_count,
            mode,
        })
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Question count as a `usize`, saturating on narrow targets.
    #[must_use]
    pub fn question_limit(&self) -> usize {
        usize::try_from(self.question_count).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }
}
