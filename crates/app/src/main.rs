use std::sync::Arc;

use engine::{CsvStore, Engine, MemoryStore, RecordStore, SessionStore};
use settings::Store;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let settings = settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "catet={level},telegram_bot={level},engine={level},sheets={level}",
            level = settings.app.level
        ))
        .init();

    let store = parse_store(&settings.store)?;
    let sessions = match &settings.app.state_path {
        Some(path) => {
            tracing::info!("keeping usernames in {}", path.display());
            SessionStore::persistent(path)
        }
        None => SessionStore::in_memory(),
    };

    let engine = Engine::builder()
        .shared_store(store)
        .sessions(sessions)
        .timezone(settings.timezone()?)
        .build();

    let bot = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_users(
            settings
                .telegram
                .allowed_users
                .iter()
                .copied()
                .map(telegram_bot::UserId)
                .collect(),
        )
        .engine(engine)
        .build()?;

    bot.run().await;
    Ok(())
}

fn parse_store(config: &Store) -> Result<Arc<dyn RecordStore>, BoxError> {
    let store: Arc<dyn RecordStore> = match config {
        Store::Memory => {
            tracing::warn!("expenses are kept in memory and lost on exit");
            Arc::new(MemoryStore::new())
        }
        Store::Csv { path } => {
            tracing::info!("recording expenses in {}", path.display());
            Arc::new(CsvStore::new(path))
        }
        Store::Sheets(sheet) => {
            let mut builder = sheets::SheetsStore::builder()
                .spreadsheet_id(&sheet.spreadsheet_id)
                .credentials(sheet.credentials()?);
            if let Some(name) = &sheet.sheet_name {
                builder = builder.sheet_name(name);
            }
            Arc::new(builder.build()?)
        }
    };
    Ok(store)
}
