use serde::Serialize;

use quiz_core::model::ReviewQuality;

use super::service::SessionPhase;

/// Notification emitted by every session transition.
///
/// A presentation layer applies these (or re-reads a [`SessionSnapshot`])
/// instead of observing mutable session fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { total: usize },
    Answered { cursor: usize, is_correct: bool },
    Graded { cursor: usize, quality: ReviewQuality },
    Advanced { cursor: usize },
    Completed { correct: usize, total: usize },
    Restarted { total: usize },
    Idle,
}

/// Presentation-agnostic copy of the observable session state.
///
/// No pre-formatted strings; the correct answer is only present once the
/// current question has been answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub cursor: usize,
    pub total: usize,
    pub correct_count: usize,
    pub subject: Option<String>,
    pub prompt: Option<String>,
    pub is_multiple_choice: bool,
    pub choices: Vec<String>,
    pub submitted_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub correct_answer: Option<String>,
    pub quality: Option<ReviewQuality>,
    pub is_last_question: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(SessionEvent::Graded {
            cursor: 2,
            quality: ReviewQuality::Good,
        })
        .unwrap();
        assert_eq!(json["event"], "graded");
        assert_eq!(json["cursor"], 2);
        assert_eq!(json["quality"], 3);
    }

    #[test]
    fn snapshot_phase_serializes_snake_case() {
        let snapshot = SessionSnapshot {
            phase: SessionPhase::Presenting,
            cursor: 0,
            total: 1,
            correct_count: 0,
            subject: Some("Doors".into()),
            prompt: Some("Q".into()),
            is_multiple_choice: false,
            choices: Vec::new(),
            submitted_answer: None,
            is_correct: None,
            correct_answer: None,
            quality: None,
            is_last_question: true,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "presenting");
        assert!(json["correct_answer"].is_null());
    }
}
