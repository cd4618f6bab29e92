use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ReviewQuality;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

/// Tally of review qualities recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityCounts {
    pub very_hard: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl QualityCounts {
    pub fn record(&mut self, quality: ReviewQuality) {
        let slot = match quality {
            ReviewQuality::VeryHard => &mut self.very_hard,
            ReviewQuality::Hard => &mut self.hard,
            ReviewQuality::Good => &mut self.good,
            ReviewQuality::Easy => &mut self.easy,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.very_hard + self.hard + self.good + self.easy
    }
}

/// Results of a completed quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    total: u32,
    correct: u32,
    qualities: QualityCounts,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Build a summary from the counters of a finished run.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` precedes `started_at`,
    /// `CorrectExceedsTotal` if the counters disagree, or `TooManyQuestions` if
    /// `total` does not fit in `u32`.
    pub fn from_parts(
        total: usize,
        correct: usize,
        qualities: QualityCounts,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let total_u32 =
            u32::try_from(total).map_err(|_| SessionSummaryError::TooManyQuestions { len: total })?;
        let correct_u32 = u32::try_from(correct).unwrap_or(u32::MAX);
        if correct_u32 > total_u32 {
            return Err(SessionSummaryError::CorrectExceedsTotal {
                correct: correct_u32,
                total: total_u32,
            });
        }

        Ok(Self {
            total: total_u32,
            correct: correct_u32,
            qualities,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn qualities(&self) -> QualityCounts {
        self.qualities
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Score as a percentage in `0.0..=100.0`; an empty run scores zero.
    #[must_use]
    pub fn score_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}
