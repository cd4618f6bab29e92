mod ids;
mod question;
mod review;
mod session;
mod settings;

pub use ids::QuestionId;

pub use question::{Question, QuestionError, QuestionKind, normalize_free_text};
pub use review::{
    DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, ReviewError, ReviewMap, ReviewQuality, ReviewRecord,
};
pub use session::{QualityCounts, SessionSummary, SessionSummaryError};
pub use settings::{DEFAULT_QUESTION_COUNT, QuizSettings, SelectionMode, SettingsError};
