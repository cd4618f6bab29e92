#![forbid(unsafe_code)]

pub mod file_store;
pub mod ledger;
pub mod question_bank;
pub mod repository;
pub mod sqlite;

pub use file_store::JsonFileStore;
pub use ledger::{LEDGER_KEY, ReviewLedger};
pub use question_bank::{JsonQuestionBank, NO_DISTRACTOR, QuestionBankEntry, QuestionBankError};
pub use repository::{InMemoryRepository, KeyValueStore, QuestionRepository, Storage, StorageError};
