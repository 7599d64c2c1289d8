use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

pub use amount::{Amount, format_money};
pub use category::Category;
pub use conversation::{Effect, Event, Reply, Step, transition};
pub use error::{EngineError, StoreError};
pub use record::ExpenseRecord;
pub use report::Report;
pub use session::{ConvState, Session, SessionStore};
pub use store::{CsvStore, MemoryStore, RecordStore};

mod amount;
mod category;
pub mod conversation;
mod error;
pub mod export;
pub mod record;
pub mod report;
mod session;
pub mod store;

type ResultEngine<T> = Result<T, EngineError>;

/// Timezone used to decide which day "today" is when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;

/// Drives conversations: runs [`transition`] for each event and executes the
/// resulting effect against the record store.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn RecordStore>,
    sessions: SessionStore,
    timezone: Tz,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Current date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one inbound event of `user_id`.
    pub async fn handle(&self, user_id: u64, event: Event) -> Reply {
        self.handle_on(user_id, event, self.today()).await
    }

    /// Same as [`Engine::handle`] with an explicit date for new records and
    /// report windows.
    pub async fn handle_on(&self, user_id: u64, event: Event, today: NaiveDate) -> Reply {
        let session = self.sessions.get(user_id).await;
        let Step { session, effect } = transition(&session, event);
        if let Err(err) = self.sessions.replace(user_id, session).await {
            tracing::warn!("failed to persist session of {user_id}: {err}");
        }

        match effect {
            Effect::Reply(reply) => reply,
            Effect::RecordExpense {
                amount,
                category,
                user,
            } => {
                self.record(ExpenseRecord::new(today, amount, category, user))
                    .await
            }
            Effect::BuildReport { user } => match self.report(&user, today).await {
                Ok(Some(report)) => Reply::Report(report),
                Ok(None) => Reply::NoData { username: user },
                Err(err) => {
                    tracing::error!("failed to build report for {user}: {err}");
                    Reply::StoreFailure
                }
            },
            Effect::Export { user } => match self.export(&user).await {
                Ok(Some((csv, entries))) => Reply::Export {
                    username: user,
                    csv,
                    entries,
                },
                Ok(None) => Reply::NoData { username: user },
                Err(err) => {
                    tracing::error!("failed to export records of {user}: {err}");
                    Reply::StoreFailure
                }
            },
        }
    }

    /// Appends `record`. The reply confirms only what the store acknowledged.
    async fn record(&self, record: ExpenseRecord) -> Reply {
        match self.store.append(&record).await {
            Ok(()) => {
                tracing::info!(
                    "recorded {} {} for {} on {}",
                    record.category,
                    record.amount,
                    record.user,
                    record.date
                );
                Reply::Recorded(record)
            }
            Err(err) => {
                tracing::error!("failed to append expense of {}: {err}", record.user);
                Reply::StoreFailure
            }
        }
    }

    /// Report of `user` for the windows around `today`, `None` without data.
    pub async fn report(&self, user: &str, today: NaiveDate) -> ResultEngine<Option<Report>> {
        let records = self.store.read_all(Some(user)).await?;
        Ok(Report::build(user, &records, today))
    }

    /// CSV bytes and number of records of `user`, `None` without data.
    pub async fn export(&self, user: &str) -> ResultEngine<Option<(Vec<u8>, usize)>> {
        let records = self.store.read_all(Some(user)).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let csv = export::to_csv(&records)?;
        Ok(Some((csv, records.len())))
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn RecordStore>>,
    sessions: Option<SessionStore>,
    timezone: Option<Tz>,
}

impl EngineBuilder {
    pub fn store(mut self, store: impl RecordStore + 'static) -> EngineBuilder {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn RecordStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    pub fn sessions(mut self, sessions: SessionStore) -> EngineBuilder {
        self.sessions = Some(sessions);
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Builds the engine. Without a store, records are kept in memory.
    pub fn build(self) -> Engine {
        let store = self.store.unwrap_or_else(|| {
            tracing::warn!("no record store configured, using memory");
            Arc::new(MemoryStore::new())
        });

        Engine {
            store,
            sessions: self.sessions.unwrap_or_default(),
            timezone: self.timezone.unwrap_or(DEFAULT_TIMEZONE),
        }
    }
}
