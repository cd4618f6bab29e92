//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ReviewError, SessionSummaryError};
use storage::repository::StorageError;

use crate::sessions::SessionPhase;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// Errors emitted by the quiz session state machine and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available")]
    Empty,
    #[error("cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("{0:?} is not one of the presented choices")]
    UnknownChoice(String),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Review(#[from] ReviewServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
