use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{
    MIN_EASE_FACTOR, Question, QuestionId, ReviewMap, ReviewQuality, ReviewRecord,
};

//
// ─── DUE BREAKDOWN ─────────────────────────────────────────────────────────────
//

/// How the questions of a (filtered) bank split by review state at a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueBreakdown {
    /// Reviewed before and due again.
    pub due: usize,
    /// Never reviewed.
    pub new: usize,
    /// Reviewed and not yet due.
    pub scheduled: usize,
}

impl DueBreakdown {
    /// Questions a spaced-repetition run could draw from.
    #[must_use]
    pub fn available(&self) -> usize {
        self.due + self.new
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// SM-2 derived scheduler.
///
/// Stateless: review state lives in the ledger's `ReviewMap` and is passed in
/// and returned by value.
///
/// # Examples
///
/// ```
/// # use quiz_core::scheduler::Scheduler;
/// # use quiz_core::model::{QuestionId, ReviewQuality};
/// let scheduler = Scheduler::new();
/// let now = chrono::Utc::now();
/// let id = QuestionId::new("What is the MTOW?");
///
/// let first = scheduler.grade(None, &id, ReviewQuality::Good, now);
/// assert_eq!(first.interval_days, 1);
///
/// let second = scheduler.grade(Some(&first), &id, ReviewQuality::Good, now);
/// assert_eq!(second.interval_days, 6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// SM-2 ease update for one grading, clamped at [`MIN_EASE_FACTOR`].
    #[must_use]
    pub fn next_ease_factor(ease_factor: f64, quality: ReviewQuality) -> f64 {
        let miss = 5.0 - f64::from(quality.code());
        (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR)
    }

    /// True once `now` reaches `last_reviewed_at + interval_days`.
    ///
    /// Unreviewed questions have no record; selection treats them as due.
    #[must_use]
    pub fn is_due(&self, record: &ReviewRecord, now: DateTime<Utc>) -> bool {
        now >= record.next_due_at()
    }

    /// Apply one grading and return the updated record.
    ///
    /// `previous` is `None` the first time a question is graded; a fresh record
    /// with default state is created before the update is applied. The caller
    /// stores the result back into the ledger.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn grade(
        &self,
        previous: Option<&ReviewRecord>,
        question_id: &QuestionId,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> ReviewRecord {
        let mut record = previous
            .cloned()
            .unwrap_or_else(|| ReviewRecord::new(question_id.clone(), now));

        record.review_count = record.review_count.saturating_add(1);
        record.ease_factor = Self::next_ease_factor(record.ease_factor, quality);
        record.interval_days = match record.review_count {
            1 => 1,
            2 => 6,
            // truncating cast; ease >= 1.3 keeps this >= 1 for any interval >= 1
            _ => (f64::from(record.interval_days) * record.ease_factor) as u32,
        };
        record.last_reviewed_at = now;

        record
    }

    /// Pick up to `max_count` questions that are due or never reviewed.
    ///
    /// Overdue and new questions are pooled and shuffled together with equal
    /// weight rather than ordered by urgency.
    pub fn select_due<R: Rng + ?Sized>(
        &self,
        questions: &[Question],
        reviews: &ReviewMap,
        subject: Option<&str>,
        max_count: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Question> {
        let candidates = questions.iter().filter(|q| q.matches_subject(subject));

        let mut due = Vec::new();
        let mut unseen = Vec::new();
        for question in candidates {
            match reviews.get(question.prompt()) {
                Some(record) if self.is_due(record, now) => due.push(question.clone()),
                Some(_) => {}
                None => unseen.push(question.clone()),
            }
        }

        due.append(&mut unseen);
        due.shuffle(rng);
        due.truncate(max_count);
        due
    }

    /// Pick up to `count` questions uniformly at random, ignoring review state.
    pub fn select_random<R: Rng + ?Sized>(
        &self,
        questions: &[Question],
        subject: Option<&str>,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let mut pool: Vec<Question> = questions
            .iter()
            .filter(|q| q.matches_subject(subject))
            .cloned()
            .collect();

        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    /// [`Scheduler::select_due`] using the thread-local RNG.
    #[must_use]
    pub fn select_due_now(
        &self,
        questions: &[Question],
        reviews: &ReviewMap,
        subject: Option<&str>,
        max_count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Question> {
        self.select_due(questions, reviews, subject, max_count, now, &mut rand::rng())
    }

    /// [`Scheduler::select_random`] using the thread-local RNG.
    #[must_use]
    pub fn select_random_now(
        &self,
        questions: &[Question],
        subject: Option<&str>,
        count: usize,
    ) -> Vec<Question> {
        self.select_random(questions, subject, count, &mut rand::rng())
    }

    /// Count due, new and scheduled questions for a subject filter.
    #[must_use]
    pub fn breakdown(
        &self,
        questions: &[Question],
        reviews: &ReviewMap,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> DueBreakdown {
        let mut out = DueBreakdown::default();
        for question in questions.iter().filter(|q| q.matches_subject(subject)) {
            match reviews.get(question.prompt()) {
                Some(record) if self.is_due(record, now) => out.due += 1,
                Some(_) => out.scheduled += 1,
                None => out.new += 1,
            }
        }
        out
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
