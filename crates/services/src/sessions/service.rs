use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fmt;

use quiz_core::model::{QualityCounts, Question, ReviewQuality, SessionSummary};

use super::progress::SessionProgress;
use super::view::{SessionEvent, SessionSnapshot};
use crate::error::SessionError;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Where a quiz run stands.
///
/// `Presenting`, `Answered` and `Graded` together make up an active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Presenting,
    Answered,
    Graded,
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Presenting | Self::Answered | Self::Graded)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Presenting => "presenting",
            SessionPhase::Answered => "answered",
            SessionPhase::Graded => "graded",
            SessionPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
struct SubmittedAnswer {
    response: String,
    is_correct: bool,
}

/// State machine for one quiz run.
///
/// Pure and synchronous: selecting questions and persisting review quality
/// are done by `QuizLoopService`, which drives this type.
pub struct QuizSession {
    questions: Vec<Question>,
    cursor: usize,
    correct_count: usize,
    phase: SessionPhase,
    choices: Vec<String>,
    submitted: Option<SubmittedAnswer>,
    quality: Option<ReviewQuality>,
    qualities: QualityCounts,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// An idle session with no questions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// An idle session shuffling answer choices with `rng`.
    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            questions: Vec::new(),
            cursor: 0,
            correct_count: 0,
            phase: SessionPhase::Idle,
            choices: Vec::new(),
            submitted: None,
            quality: None,
            qualities: QualityCounts::default(),
            started_at: None,
            completed_at: None,
            rng,
        }
    }

    /// Begin a run over `questions`, replacing any previous run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty; the session is
    /// left untouched.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<SessionEvent, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        self.questions = questions;
        self.reset(started_at);
        self.present_current();
        Ok(SessionEvent::Started {
            total: self.questions.len(),
        })
    }

    /// Grade `response` against the current question.
    ///
    /// Multiple-choice responses must be one of the presented choices.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Presenting`, or
    /// `SessionError::UnknownChoice` for a response that was never offered.
    pub fn submit_answer(&mut self, response: &str) -> Result<SessionEvent, SessionError> {
        self.expect_phase("submit an answer", SessionPhase::Presenting)?;
        let question = &self.questions[self.cursor];

        if question.is_multiple_choice() && !self.choices.iter().any(|c| c == response) {
            return Err(SessionError::UnknownChoice(response.to_owned()));
        }

        let is_correct = question.grade_response(response);
        if is_correct {
            self.correct_count += 1;
        }
        self.submitted = Some(SubmittedAnswer {
            response: response.to_owned(),
            is_correct,
        });
        self.phase = SessionPhase::Answered;

        Ok(SessionEvent::Answered {
            cursor: self.cursor,
            is_correct,
        })
    }

    /// The question awaiting a review quality.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answered`.
    pub fn question_to_grade(&self) -> Result<&Question, SessionError> {
        self.expect_phase("submit a review quality", SessionPhase::Answered)?;
        Ok(&self.questions[self.cursor])
    }

    /// Record the learner's self-assessed quality for the current question.
    ///
    /// Persisting the grade to the ledger is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Answered`.
    pub fn record_quality(&mut self, quality: ReviewQuality) -> Result<SessionEvent, SessionError> {
        self.question_to_grade()?;
        self.quality = Some(quality);
        self.qualities.record(quality);
        self.phase = SessionPhase::Graded;
        Ok(SessionEvent::Graded {
            cursor: self.cursor,
            quality,
        })
    }

    /// Move to the next question, or complete the run after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Graded`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<SessionEvent, SessionError> {
        self.expect_phase("advance", SessionPhase::Graded)?;

        if self.is_last_question() {
            self.phase = SessionPhase::Completed;
            self.completed_at = Some(now);
            return Ok(SessionEvent::Completed {
                correct: self.correct_count,
                total: self.questions.len(),
            });
        }

        self.cursor += 1;
        self.present_current();
        Ok(SessionEvent::Advanced {
            cursor: self.cursor,
        })
    }

    /// Replay the same questions from the top with cleared counters.
    pub fn restart(&mut self, now: DateTime<Utc>) -> SessionEvent {
        self.reset(now);
        if self.questions.is_empty() {
            self.phase = SessionPhase::Idle;
            self.started_at = None;
            return SessionEvent::Idle;
        }
        self.present_current();
        SessionEvent::Restarted {
            total: self.questions.len(),
        }
    }

    fn reset(&mut self, now: DateTime<Utc>) {
        self.cursor = 0;
        self.correct_count = 0;
        self.qualities = QualityCounts::default();
        self.started_at = Some(now);
        self.completed_at = None;
        self.clear_question_state();
    }

    fn clear_question_state(&mut self) {
        self.choices.clear();
        self.submitted = None;
        self.quality = None;
    }

    fn present_current(&mut self) {
        self.clear_question_state();
        let question = &self.questions[self.cursor];
        if question.is_multiple_choice() {
            self.choices = question.shuffled_choices(&mut self.rng);
        }
        self.phase = SessionPhase::Presenting;
    }

    fn expect_phase(
        &self,
        operation: &'static str,
        expected: SessionPhase,
    ) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase.is_active() {
            self.questions.get(self.cursor)
        } else {
            None
        }
    }

    /// Shuffled choices for the current multiple-choice question; empty otherwise.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn submitted_answer(&self) -> Option<&str> {
        self.submitted.as_ref().map(|s| s.response.as_str())
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.submitted.as_ref().map(|s| s.is_correct)
    }

    #[must_use]
    pub fn quality(&self) -> Option<ReviewQuality> {
        self.quality
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.cursor == self.questions.len() - 1
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = match self.phase {
            SessionPhase::Idle => 0,
            SessionPhase::Presenting => self.cursor,
            SessionPhase::Answered | SessionPhase::Graded => self.cursor + 1,
            SessionPhase::Completed => total,
        };
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            correct: self.correct_count,
            is_complete: self.is_complete(),
        }
    }

    /// Immutable copy of everything a presentation layer renders.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let question = self.current_question();
        let answered = self.submitted.is_some();
        SessionSnapshot {
            phase: self.phase,
            cursor: self.cursor,
            total: self.questions.len(),
            correct_count: self.correct_count,
            subject: question.map(|q| q.subject().to_owned()),
            prompt: question.map(|q| q.prompt().to_owned()),
            is_multiple_choice: question.is_some_and(Question::is_multiple_choice),
            choices: self.choices.clone(),
            submitted_answer: self.submitted_answer().map(str::to_owned),
            is_correct: self.is_correct(),
            correct_answer: question
                .filter(|_| answered)
                .map(|q| q.answer().to_owned()),
            quality: self.quality,
            is_last_question: self.is_last_question(),
        }
    }

    /// Results of the run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the run is completed,
    /// or `SessionError::Summary` if the counters are inconsistent.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        self.expect_phase("summarize", SessionPhase::Completed)?;
        let (Some(started_at), Some(completed_at)) = (self.started_at, self.completed_at) else {
            return Err(SessionError::InvalidTransition {
                operation: "summarize",
                phase: self.phase,
            });
        };
        Ok(SessionSummary::from_parts(
            self.questions.len(),
            self.correct_count,
            self.qualities,
            started_at,
            completed_at,
        )?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("correct_count", &self.correct_count)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
