use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Ease factor assigned to a question on its first grading.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound the ease factor is clamped to.
pub const MIN_EASE_FACTOR: f64 = 1.3;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review quality code: {0} (expected 0, 1, 3 or 5)")]
    InvalidQuality(u8),
}

//
// ─── REVIEW QUALITY ───────────────────────────────────────────────────────────
//

/// Self-assessed recall quality captured after each answer.
///
/// The integer codes feed the ease-factor formula directly. Codes 2 and 4
/// are unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewQuality {
    VeryHard,
    Hard,
    Good,
    Easy,
}

impl ReviewQuality {
    /// All qualities in the order they are offered to the learner.
    pub const ALL: [ReviewQuality; 4] = [
        ReviewQuality::VeryHard,
        ReviewQuality::Hard,
        ReviewQuality::Good,
        ReviewQuality::Easy,
    ];

    /// Parse an integer quality code.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` for any code outside {0, 1, 3, 5}.
    pub fn from_code(code: u8) -> Result<Self, ReviewError> {
        match code {
            0 => Ok(Self::VeryHard),
            1 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            5 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidQuality(code)),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            ReviewQuality::VeryHard => 0,
            ReviewQuality::Hard => 1,
            ReviewQuality::Good => 3,
            ReviewQuality::Easy => 5,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ReviewQuality::VeryHard => "Very Hard",
            ReviewQuality::Hard => "Hard",
            ReviewQuality::Good => "Good",
            ReviewQuality::Easy => "Easy",
        }
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_code(value)
    }
}

impl From<ReviewQuality> for u8 {
    fn from(value: ReviewQuality) -> Self {
        value.code()
    }
}

impl fmt::Display for ReviewQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── REVIEW RECORD ────────────────────────────────────────────────────────────
//

/// SM-2 state for one question, created lazily on its first grading.
///
/// Field names on the wire follow the historical ledger layout so existing
/// ledgers keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub question_id: QuestionId,
    #[serde(rename = "lastReviewed")]
    pub last_reviewed_at: DateTime<Utc>,
    #[serde(rename = "interval")]
    pub interval_days: u32,
    pub ease_factor: f64,
    pub review_count: u32,
}

impl ReviewRecord {
    /// Fresh record with default SM-2 state, before any grading is applied.
    #[must_use]
    pub fn new(question_id: QuestionId, now: DateTime<Utc>) -> Self {
        Self {
            question_id,
            last_reviewed_at: now,
            interval_days: 1,
            ease_factor: DEFAULT_EASE_FACTOR,
            review_count: 0,
        }
    }

    /// Moment the question becomes due again.
    ///
    /// Saturates at `DateTime::<Utc>::MAX_UTC` when the interval runs past the
    /// representable calendar; such a question is never due.
    #[must_use]
    pub fn next_due_at(&self) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.interval_days))
            .and_then(|interval| self.last_reviewed_at.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// The whole ledger: one record per reviewed question.
pub type ReviewMap = BTreeMap<QuestionId, ReviewRecord>;

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn quality_codes_keep_their_gaps() {
        let codes: Vec<u8> = ReviewQuality::ALL.iter().map(|q| q.code()).collect();
        assert_eq!(codes, vec![0, 1, 3, 5]);

        for code in [0, 1, 3, 5] {
            assert_eq!(ReviewQuality::from_code(code).unwrap().code(), code);
        }
        for code in [2, 4, 6, 255] {
            assert_eq!(
                ReviewQuality::from_code(code).unwrap_err(),
                ReviewError::InvalidQuality(code)
            );
        }
    }

    #[test]
    fn labels_match_rating_buttons() {
        assert_eq!(ReviewQuality::VeryHard.to_string(), "Very Hard");
        assert_eq!(ReviewQuality::Easy.label(), "Easy");
    }

    #[test]
    fn new_record_has_defaults() {
        let record = ReviewRecord::new(QuestionId::new("Q"), fixed_now());
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.review_count, 0);
        assert!((record.ease_factor - DEFAULT_EASE_FACTOR).abs() < f64::EPSILON);
        assert_eq!(record.next_due_at(), fixed_now() + Duration::days(1));
    }

    #[test]
    fn oversized_interval_saturates_instead_of_overflowing() {
        let json = format!(
            r#"{{"questionId":"Q","lastReviewed":"{}","interval":4000000000,"easeFactor":2.5,"reviewCount":9}}"#,
            fixed_now().to_rfc3339()
        );
        let record: ReviewRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.next_due_at(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn record_uses_ledger_field_names() {
        let record = ReviewRecord::new(QuestionId::new("Q"), fixed_now());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["questionId"], "Q");
        assert_eq!(value["interval"], 1);
        assert_eq!(value["easeFactor"], 2.5);
        assert_eq!(value["reviewCount"], 0);
        assert!(value["lastReviewed"].is_string());
    }

    #[test]
    fn quality_deserialization_rejects_unused_codes() {
        assert_eq!(
            serde_json::from_str::<ReviewQuality>("3").unwrap(),
            ReviewQuality::Good
        );
        assert!(serde_json::from_str::<ReviewQuality>("4").is_err());
    }
}
