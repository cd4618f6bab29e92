/// Aggregated view of run progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub correct: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Share of questions answered, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.answered as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_handles_empty_and_partial() {
        let empty = SessionProgress {
            total: 0,
            answered: 0,
            remaining: 0,
            correct: 0,
            is_complete: false,
        };
        assert_eq!(empty.fraction(), 0.0);

        let half = SessionProgress {
            total: 4,
            answered: 2,
            remaining: 2,
            correct: 1,
            is_complete: false,
        };
        assert!((half.fraction() - 0.5).abs() < f64::EPSILON);
    }
}
