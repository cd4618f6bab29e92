use std::sync::Arc;

use quiz_core::model::{QuestionId, ReviewMap, ReviewQuality};
use quiz_core::scheduler::Scheduler;
use quiz_core::time::fixed_now;
use storage::ledger::{LEDGER_KEY, ReviewLedger};
use storage::question_bank::JsonQuestionBank;
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_round_trips_and_upserts() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // migrations are idempotent
    repo.migrate().await.expect("migrate twice");

    assert_eq!(repo.read(LEDGER_KEY).await.unwrap(), None);

    repo.write(LEDGER_KEY, "{}").await.unwrap();
    repo.write(LEDGER_KEY, r#"{"x":1}"#).await.unwrap();

    let value = repo.read(LEDGER_KEY).await.unwrap();
    assert_eq!(value.as_deref(), Some(r#"{"x":1}"#));
}

#[tokio::test]
async fn ledger_persists_through_sqlite() {
    let questions = Arc::new(JsonQuestionBank::from_questions(Vec::new()));
    let storage = Storage::sqlite(
        "sqlite:file:memdb_ledger?mode=memory&cache=shared",
        questions,
    )
    .await
    .expect("storage");

    let ledger = ReviewLedger::new(Arc::clone(&storage.kv));
    assert!(ledger.load().await.is_empty());

    let id = QuestionId::new("What is the APU?");
    let record = Scheduler::new().grade(None, &id, ReviewQuality::Easy, fixed_now());
    let mut map = ReviewMap::new();
    map.insert(id.clone(), record.clone());
    ledger.save(&map).await.unwrap();

    let reopened = ReviewLedger::new(Arc::clone(&storage.kv));
    assert_eq!(reopened.get(&id).await, Some(record));
}

#[tokio::test]
async fn corrupt_sqlite_slot_is_cold_start() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.write(LEDGER_KEY, "not json at all").await.unwrap();

    let ledger = ReviewLedger::new(Arc::new(repo));
    assert!(ledger.load().await.is_empty());
}
