use std::sync::Arc;

use quiz_core::model::{QuizSettings, ReviewQuality};
use quiz_core::scheduler::{DueBreakdown, Scheduler};
use storage::ledger::ReviewLedger;
use storage::repository::{QuestionRepository, Storage};

use super::plan::SessionPlan;
use super::queries::SessionQueries;
use super::service::QuizSession;
use super::view::SessionEvent;
use crate::error::{ReviewServiceError, SessionError};
use crate::review_service::{RecordedReview, ReviewService};
use crate::Clock;

/// Result of rating the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    pub event: SessionEvent,
    pub review: RecordedReview,
}

/// Orchestrates question selection, session transitions and ledger updates.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    scheduler: Scheduler,
    questions: Arc<dyn QuestionRepository>,
    ledger: ReviewLedger,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>, ledger: ReviewLedger) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            questions,
            ledger,
        }
    }

    /// Wire the service to a `Storage` bundle using the default ledger slot.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.questions),
            ReviewLedger::new(Arc::clone(&storage.kv)),
        )
    }

    #[must_use]
    pub fn ledger(&self) -> &ReviewLedger {
        &self.ledger
    }

    fn review_service(&self) -> ReviewService {
        ReviewService::new(self.ledger.clone()).with_clock(self.clock)
    }

    /// Sorted subjects available in the question bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the bank cannot be read.
    pub async fn subjects(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.questions.list_subjects().await?)
    }

    /// Due/new/scheduled counts for a subject filter at the current time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the bank cannot be read.
    pub async fn due_breakdown(&self, subject: Option<&str>) -> Result<DueBreakdown, SessionError> {
        SessionQueries::due_breakdown(
            self.questions.as_ref(),
            &self.ledger,
            &self.scheduler,
            subject,
            self.clock.now(),
        )
        .await
    }

    /// Select questions for `settings` without starting a run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the bank cannot be read.
    pub async fn plan(&self, settings: &QuizSettings) -> Result<SessionPlan, SessionError> {
        SessionQueries::build_plan(
            self.questions.as_ref(),
            &self.ledger,
            &self.scheduler,
            settings,
            self.clock.now(),
        )
        .await
    }

    /// Select questions and start a fresh session over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no questions match (no questions
    /// for the subject, or nothing due), or `SessionError::Storage` if the bank
    /// cannot be read.
    pub async fn start(&self, settings: &QuizSettings) -> Result<QuizSession, SessionError> {
        let mut session = QuizSession::new();
        self.start_into(&mut session, settings).await?;
        Ok(session)
    }

    /// Select questions and (re)start `session` over them.
    ///
    /// On `SessionError::Empty` the session keeps its previous state.
    ///
    /// # Errors
    ///
    /// See [`QuizLoopService::start`].
    pub async fn start_into(
        &self,
        session: &mut QuizSession,
        settings: &QuizSettings,
    ) -> Result<SessionEvent, SessionError> {
        let plan = self.plan(settings).await?;
        if plan.is_empty() {
            tracing::info!(
                mode = ?settings.mode(),
                subject = settings.subject().unwrap_or("all"),
                "no questions available"
            );
            return Err(SessionError::Empty);
        }
        session.start(plan.questions, self.clock.now())
    }

    /// Grade a response to the current question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::submit_answer`].
    pub fn submit_answer(
        &self,
        session: &mut QuizSession,
        response: &str,
    ) -> Result<SessionEvent, SessionError> {
        session.submit_answer(response)
    }

    /// Rate the current question, update its ledger entry, and mark it graded.
    ///
    /// A failed ledger write does not fail this call; see
    /// `RecordedReview::persisted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the current question has
    /// been answered and not yet rated.
    pub async fn submit_review_quality(
        &self,
        session: &mut QuizSession,
        quality: ReviewQuality,
    ) -> Result<ReviewSubmission, SessionError> {
        let question_id = session.question_to_grade()?.id();
        let review = self.review_service().record_review(&question_id, quality).await;
        let event = session.record_quality(quality)?;
        Ok(ReviewSubmission { event, review })
    }

    /// [`QuizLoopService::submit_review_quality`] taking the raw quality code.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Review` for a code outside {0, 1, 3, 5}; the
    /// session and ledger are left untouched.
    pub async fn submit_review_code(
        &self,
        session: &mut QuizSession,
        code: u8,
    ) -> Result<ReviewSubmission, SessionError> {
        let quality = ReviewQuality::from_code(code).map_err(ReviewServiceError::from)?;
        self.submit_review_quality(session, quality).await
    }

    /// Move past a rated question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::advance`].
    pub fn advance(&self, session: &mut QuizSession) -> Result<SessionEvent, SessionError> {
        let event = session.advance(self.clock.now())?;
        if let SessionEvent::Completed { correct, total } = event {
            tracing::info!(correct, total, "quiz completed");
        }
        Ok(event)
    }

    /// Replay the session's own questions; nothing is re-selected.
    pub fn restart(&self, session: &mut QuizSession) -> SessionEvent {
        session.restart(self.clock.now())
    }
}

impl std::fmt::Debug for QuizLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizLoopService")
            .field("clock", &self.clock)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
