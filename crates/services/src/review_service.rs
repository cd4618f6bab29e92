use chrono::{DateTime, Utc};

use quiz_core::{
    model::{QuestionId, ReviewQuality, ReviewRecord},
    scheduler::Scheduler,
    time::Clock,
};
use storage::ledger::ReviewLedger;

use crate::error::ReviewServiceError;

//
// ─── RECORDED REVIEW ───────────────────────────────────────────────────────────
//

/// Outcome of grading one question against the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReview {
    pub record: ReviewRecord,
    pub quality: ReviewQuality,
    /// False when the ledger write failed; the session carries on regardless.
    pub persisted: bool,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Applies a review quality to a question's ledger entry and persists the ledger.
#[derive(Debug, Clone)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
    ledger: ReviewLedger,
}

impl ReviewService {
    #[must_use]
    pub fn new(ledger: ReviewLedger) -> Self {
        Self {
            clock: Clock::default(),
            scheduler: Scheduler::new(),
            ledger,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn ledger(&self) -> &ReviewLedger {
        &self.ledger
    }

    /// Grade `question_id` with `quality` and write the whole ledger back.
    ///
    /// The ledger is loaded fresh, so a corrupt or missing blob starts from an
    /// empty history. A failed write is logged and reported through
    /// `RecordedReview::persisted`; it never aborts the caller.
    pub async fn record_review(
        &self,
        question_id: &QuestionId,
        quality: ReviewQuality,
    ) -> RecordedReview {
        let now = self.now();
        let mut reviews = self.ledger.load().await;

        let record = self
            .scheduler
            .grade(reviews.get(question_id), question_id, quality, now);
        reviews.insert(question_id.clone(), record.clone());

        let persisted = match self.ledger.save(&reviews).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    question = %question_id,
                    error = %err,
                    "failed to persist review ledger; continuing without saving"
                );
                false
            }
        };

        tracing::debug!(
            question = %question_id,
            quality = quality.code(),
            interval_days = record.interval_days,
            ease_factor = record.ease_factor,
            review_count = record.review_count,
            "review recorded"
        );

        RecordedReview {
            record,
            quality,
            persisted,
        }
    }

    /// Like [`ReviewService::record_review`], taking the raw integer quality code.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Review` if `code` is not one of 0, 1, 3 or 5.
    /// Nothing is written in that case.
    pub async fn record_review_code(
        &self,
        question_id: &QuestionId,
        code: u8,
    ) -> Result<RecordedReview, ReviewServiceError> {
        let quality = ReviewQuality::from_code(code)?;
        Ok(self.record_review(question_id, quality).await)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
