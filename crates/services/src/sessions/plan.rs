use chrono::{DateTime, Utc};

use quiz_core::model::{Question, ReviewMap, SelectionMode};
use quiz_core::scheduler::Scheduler;

/// Questions chosen for a run, with a breakdown of why each was picked.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub mode: SelectionMode,
    /// Picked because their review interval has elapsed.
    pub due_selected: usize,
    /// Picked because they were never reviewed.
    pub new_selected: usize,
}

impl SessionPlan {
    /// Classify already-selected questions against the ledger.
    #[must_use]
    pub fn classify(
        questions: Vec<Question>,
        mode: SelectionMode,
        reviews: &ReviewMap,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Self {
        let mut due_selected = 0;
        let mut new_selected = 0;
        for question in &questions {
            match reviews.get(question.prompt()) {
                Some(record) if scheduler.is_due(record, now) => due_selected += 1,
                Some(_) => {}
                None => new_selected += 1,
            }
        }
        Self {
            questions,
            mode,
            due_selected,
            new_selected,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuestionId, QuestionKind, ReviewQuality};
    use quiz_core::time::fixed_now;

    fn question(prompt: &str) -> Question {
        Question::new("S", QuestionKind::FreeText, prompt, "A", Vec::new()).unwrap()
    }

    #[test]
    fn classify_counts_due_new_and_scheduled() {
        let scheduler = Scheduler::new();
        let now = fixed_now();
        let mut reviews = ReviewMap::new();

        let due = QuestionId::new("due");
        reviews.insert(
            due.clone(),
            scheduler.grade(None, &due, ReviewQuality::Good, now - Duration::days(2)),
        );
        let fresh = QuestionId::new("fresh");
        reviews.insert(
            fresh.clone(),
            scheduler.grade(None, &fresh, ReviewQuality::Good, now),
        );

        let plan = SessionPlan::classify(
            vec![question("due"), question("fresh"), question("new")],
            SelectionMode::Random,
            &reviews,
            &scheduler,
            now,
        );

        assert_eq!(plan.total(), 3);
        assert_eq!(plan.due_selected, 1);
        assert_eq!(plan.new_selected, 1);
        assert!(!plan.is_empty());
    }
}
