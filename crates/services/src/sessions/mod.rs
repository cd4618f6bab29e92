mod plan;
mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::SessionPlan;
pub use progress::SessionProgress;
pub use service::{QuizSession, SessionPhase};
pub use view::{SessionEvent, SessionSnapshot};
pub use workflow::{QuizLoopService, ReviewSubmission};
