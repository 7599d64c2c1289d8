use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveDate;

use engine::{
    Amount, Category, ConvState, Engine, Event, ExpenseRecord, MemoryStore, RecordStore, Reply,
    StoreError,
};

const ALICE: u64 = 1001;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn engine_with_memory() -> (Engine, MemoryStore) {
    let store = MemoryStore::new();
    let engine = Engine::builder().store(store.clone()).build();
    (engine, store)
}

async fn send(engine: &Engine, event: Event) -> Reply {
    engine.handle_on(ALICE, event, today()).await
}

async fn onboard(engine: &Engine, username: &str) {
    send(engine, Event::Start { first_name: None }).await;
    let reply = send(engine, Event::Text(username.to_string())).await;
    assert_eq!(
        reply,
        Reply::UsernameSaved {
            username: username.to_string()
        }
    );
}

/// Store whose writes and reads always fail.
#[derive(Default)]
struct FailingStore {
    appends: AtomicUsize,
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn append(&self, _record: &ExpenseRecord) -> Result<(), StoreError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn read_all(&self, _user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn alice_records_lunch() {
    let (engine, store) = engine_with_memory();
    onboard(&engine, "alice").await;

    let reply = send(&engine, Event::NewExpense).await;
    assert!(matches!(reply, Reply::ChooseCategory { .. }));

    let reply = send(&engine, Event::CategoryChosen("Lunch".to_string())).await;
    assert_eq!(
        reply,
        Reply::AskAmount {
            category: Category::new("Lunch")
        }
    );

    let reply = send(&engine, Event::Text("25000".to_string())).await;
    let expected = ExpenseRecord::new(
        today(),
        Amount::new(25000.0).unwrap(),
        Category::new("Lunch"),
        "alice",
    );
    assert_eq!(reply, Reply::Recorded(expected.clone()));
    assert_eq!(store.read_all(None).await.unwrap(), vec![expected]);
    assert_eq!(engine.sessions().get(ALICE).await.state, ConvState::Idle);
}

#[tokio::test]
async fn malformed_amount_writes_nothing() {
    let (engine, store) = engine_with_memory();
    onboard(&engine, "alice").await;
    send(&engine, Event::NewExpense).await;
    send(&engine, Event::CategoryChosen("Dinner".to_string())).await;

    let reply = send(&engine, Event::Text("abc".to_string())).await;
    assert_eq!(
        reply,
        Reply::InvalidAmount {
            input: "abc".to_string()
        }
    );
    assert!(store.is_empty().await);
    assert_eq!(
        engine.sessions().get(ALICE).await.state,
        ConvState::AwaitingAmount
    );

    // The user can retry right away.
    let reply = send(&engine, Event::Text("12000".to_string())).await;
    assert!(matches!(reply, Reply::Recorded(_)));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn commands_before_onboarding_are_rejected() {
    let (engine, store) = engine_with_memory();

    assert_eq!(send(&engine, Event::NewExpense).await, Reply::UsernameRequired);
    assert_eq!(send(&engine, Event::Report).await, Reply::UsernameRequired);
    assert_eq!(
        send(&engine, Event::Text("25000".to_string())).await,
        Reply::UsernameRequired
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn last_category_is_reused_for_quick_entries() {
    let (engine, store) = engine_with_memory();
    onboard(&engine, "alice").await;

    send(&engine, Event::Text("5000".to_string())).await;
    send(&engine, Event::NewExpense).await;
    send(&engine, Event::CategoryChosen("Breakfast".to_string())).await;
    send(&engine, Event::Text("8000".to_string())).await;
    send(&engine, Event::Text("9000".to_string())).await;

    let categories: Vec<String> = store
        .read_all(Some("alice"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.category.to_string())
        .collect();
    assert_eq!(categories, vec!["Other", "Breakfast", "Breakfast"]);
}

#[tokio::test]
async fn cancel_discards_pending_entry() {
    let (engine, store) = engine_with_memory();
    onboard(&engine, "alice").await;
    send(&engine, Event::NewExpense).await;
    send(&engine, Event::CategoryChosen("Lunch".to_string())).await;

    assert_eq!(send(&engine, Event::Cancel).await, Reply::Cancelled);
    assert!(store.is_empty().await);
    let session = engine.sessions().get(ALICE).await;
    assert_eq!(session.state, ConvState::Idle);
    assert_eq!(session.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn report_of_three_entries_today() {
    let (engine, _store) = engine_with_memory();
    onboard(&engine, "alice").await;
    for amount in ["10000", "20000", "30000"] {
        send(&engine, Event::Text(amount.to_string())).await;
    }

    let Reply::Report(report) = send(&engine, Event::Report).await else {
        panic!("expected a report");
    };
    assert_eq!(report.user, "alice");
    assert_eq!(report.day.total, 60000.0);
    assert_eq!(report.day.mean, Some(20000.0));
    assert_eq!(report.recent.len(), 3);

    // Asking again without new entries gives the same numbers.
    assert_eq!(send(&engine, Event::Report).await, Reply::Report(report));
}

#[tokio::test]
async fn report_only_sees_own_records() {
    let records = vec![ExpenseRecord::new(
        today(),
        Amount::new(700.0).unwrap(),
        Category::new("Lunch"),
        "bob",
    )];
    let engine = Engine::builder()
        .store(MemoryStore::with_records(records))
        .build();
    onboard(&engine, "alice").await;

    assert_eq!(
        send(&engine, Event::Report).await,
        Reply::NoData {
            username: "alice".to_string()
        }
    );
}

#[tokio::test]
async fn empty_store_report_is_no_data() {
    let (engine, _store) = engine_with_memory();
    onboard(&engine, "alice").await;
    assert_eq!(
        send(&engine, Event::Report).await,
        Reply::NoData {
            username: "alice".to_string()
        }
    );
    assert_eq!(
        send(&engine, Event::Export).await,
        Reply::NoData {
            username: "alice".to_string()
        }
    );
}

#[tokio::test]
async fn export_contains_user_rows() {
    let (engine, _store) = engine_with_memory();
    onboard(&engine, "alice").await;
    send(&engine, Event::Text("1500".to_string())).await;

    let Reply::Export { csv, entries, .. } = send(&engine, Event::Export).await else {
        panic!("expected an export");
    };
    assert_eq!(entries, 1);
    assert_eq!(
        String::from_utf8(csv).unwrap(),
        "Date,Amount,Category,User\n2025-06-15,1500,Other,alice\n"
    );
}

#[tokio::test]
async fn store_failure_is_not_confirmed() {
    let store = Arc::new(FailingStore::default());
    let engine = Engine::builder().shared_store(store.clone()).build();
    onboard(&engine, "alice").await;
    send(&engine, Event::NewExpense).await;
    send(&engine, Event::CategoryChosen("Lunch".to_string())).await;

    assert_eq!(
        send(&engine, Event::Text("25000".to_string())).await,
        Reply::StoreFailure
    );
    assert_eq!(store.appends.load(Ordering::SeqCst), 1);

    let session = engine.sessions().get(ALICE).await;
    assert_eq!(session.state, ConvState::Idle);
    assert_eq!(session.category, Some(Category::new("Lunch")));

    assert_eq!(send(&engine, Event::Report).await, Reply::StoreFailure);
}

#[tokio::test]
async fn users_do_not_share_sessions() {
    let (engine, _store) = engine_with_memory();
    onboard(&engine, "alice").await;

    let reply = engine
        .handle_on(2002, Event::NewExpense, today())
        .await;
    assert_eq!(reply, Reply::UsernameRequired);
}
