use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question answer cannot be empty")]
    EmptyAnswer,

    #[error("question subject cannot be empty")]
    EmptySubject,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// How a response to a question is collected and graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// Learner picks one of the presented choices; graded by exact match.
    MultipleChoice,
    /// Learner types an answer; graded ignoring case and surrounding whitespace.
    FreeText,
}

impl QuestionKind {
    #[must_use]
    pub fn from_multi_choice(multi_choice: bool) -> Self {
        if multi_choice {
            Self::MultipleChoice
        } else {
            Self::FreeText
        }
    }

    #[must_use]
    pub fn is_multiple_choice(self) -> bool {
        matches!(self, Self::MultipleChoice)
    }
}

/// An immutable question record supplied by a question repository.
///
/// `wrong_answers` never contains placeholder entries; those are stripped
/// while importing a bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    subject: String,
    kind: QuestionKind,
    prompt: String,
    answer: String,
    wrong_answers: Vec<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the subject, prompt or answer is blank.
    pub fn new(
        subject: impl Into<String>,
        kind: QuestionKind,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        wrong_answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let subject = subject.into();
        let prompt = prompt.into();
        let answer = answer.into();

        if subject.trim().is_empty() {
            return Err(QuestionError::EmptySubject);
        }
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }

        Ok(Self {
            subject,
            kind,
            prompt,
            answer,
            wrong_answers,
        })
    }

    /// Ledger identity of this question (the prompt text).
    #[must_use]
    pub fn id(&self) -> QuestionId {
        QuestionId::new(self.prompt.clone())
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.kind.is_multiple_choice()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn wrong_answers(&self) -> &[String] {
        &self.wrong_answers
    }

    /// Correct answer followed by the distractors, unshuffled.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        let mut choices = Vec::with_capacity(self.wrong_answers.len() + 1);
        choices.push(self.answer.clone());
        choices.extend(self.wrong_answers.iter().cloned());
        choices
    }

    /// Choices in a fresh random order. Callers shuffle again on every presentation.
    pub fn shuffled_choices<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut choices = self.choices();
        choices.shuffle(rng);
        choices
    }

    #[must_use]
    pub fn matches_subject(&self, subject: Option<&str>) -> bool {
        subject.is_none_or(|s| self.subject == s)
    }

    /// Grade a learner response against the canonical answer.
    #[must_use]
    pub fn grade_response(&self, response: &str) -> bool {
        match self.kind {
            QuestionKind::MultipleChoice => response == self.answer,
            QuestionKind::FreeText => {
                normalize_free_text(response) == normalize_free_text(&self.answer)
            }
        }
    }
}

/// Canonical form used for free-text comparison.
#[must_use]
pub fn normalize_free_text(text: &str) -> String {
    text.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
