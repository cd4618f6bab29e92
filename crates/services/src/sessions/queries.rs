use chrono::{DateTime, Utc};

use quiz_core::model::{QuizSettings, SelectionMode};
use quiz_core::scheduler::{DueBreakdown, Scheduler};
use storage::ledger::ReviewLedger;
use storage::repository::QuestionRepository;

use super::plan::SessionPlan;
use crate::error::SessionError;

/// Storage-backed question selection for quiz runs.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Select questions for a run according to `settings`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the question repository fails.
    /// An empty selection is not an error here.
    pub async fn build_plan(
        questions: &dyn QuestionRepository,
        ledger: &ReviewLedger,
        scheduler: &Scheduler,
        settings: &QuizSettings,
        now: DateTime<Utc>,
    ) -> Result<SessionPlan, SessionError> {
        let all = questions.list_all().await?;
        let reviews = ledger.load().await;
        let limit = settings.question_limit();

        let picked = match settings.mode() {
            SelectionMode::Due => {
                scheduler.select_due_now(&all, &reviews, settings.subject(), limit, now)
            }
            SelectionMode::Random => scheduler.select_random_now(&all, settings.subject(), limit),
        };

        let plan = SessionPlan::classify(picked, settings.mode(), &reviews, scheduler, now);
        tracing::debug!(
            mode = ?plan.mode,
            subject = settings.subject().unwrap_or("all"),
            bank = all.len(),
            selected = plan.total(),
            due = plan.due_selected,
            new = plan.new_selected,
            "session plan built"
        );
        Ok(plan)
    }

    /// Count due, new and scheduled questions for a subject filter.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the question repository fails.
    pub async fn due_breakdown(
        questions: &dyn QuestionRepository,
        ledger: &ReviewLedger,
        scheduler: &Scheduler,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DueBreakdown, SessionError> {
        let all = questions.list_all().await?;
        let reviews = ledger.load().await;
        Ok(scheduler.breakdown(&all, &reviews, subject, now))
    }
}
