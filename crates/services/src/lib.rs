#![forbid(unsafe_code)]

pub mod error;
pub mod review_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{ReviewServiceError, SessionError};
pub use review_service::{RecordedReview, ReviewService};

pub use sessions::{
    QuizLoopService, QuizSession, ReviewSubmission, SessionEvent, SessionPhase, SessionProgress,
    SessionSnapshot,
};
