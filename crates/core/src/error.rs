use thiserror::Error;

use crate::model::{QuestionError, ReviewError, SessionSummaryError, SettingsError};

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
