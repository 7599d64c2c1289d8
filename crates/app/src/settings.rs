//! Settings of the bot.
//!
//! Layered, lowest priority first: the variables of older deployments
//! (`TELEGRAM_BOT_TOKEN`, `SHEET_ID`, `GOOGLE_APPLICATION_CREDENTIALS` and the
//! `GS_*` service-account fields), the TOML file (`config/catet.toml` or
//! `--config`), and `CATET__*` variables such as `CATET__TELEGRAM__TOKEN`.
use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, ConfigError, Environment, File, Map, Source};
use serde::Deserialize;
use sheets::{Credentials, ServiceAccountKey, SheetsError};

const DEFAULT_CONFIG_PATH: &str = "config/catet.toml";
const ENV_PREFIX: &str = "CATET";

const LEGACY_VARS: [(&str, &str); 3] = [
    ("TELEGRAM_BOT_TOKEN", "telegram.token"),
    ("SHEET_ID", "store.spreadsheet_id"),
    ("GOOGLE_APPLICATION_CREDENTIALS", "store.credentials_path"),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub timezone: String,
    /// Where usernames are kept across restarts.
    pub state_path: Option<PathBuf>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: engine::DEFAULT_TIMEZONE.name().to_string(),
            state_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Store {
    #[default]
    Memory,
    Csv {
        path: PathBuf,
    },
    Sheets(SheetsSettings),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SheetsSettings {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// Service-account key file.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Service-account key inline, as JSON.
    #[serde(default)]
    pub credentials_json: Option<String>,
    /// A ready OAuth2 access token instead of a service account.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl SheetsSettings {
    pub fn credentials(&self) -> Result<Credentials, SheetsError> {
        if let Some(raw) = &self.credentials_json {
            return Ok(Credentials::ServiceAccount(ServiceAccountKey::from_json(raw)?));
        }
        if let Some(path) = &self.credentials_path {
            return Ok(Credentials::ServiceAccount(ServiceAccountKey::from_file(path)?));
        }
        if let Some(token) = &self.access_token {
            return Ok(Credentials::Bearer(token.clone()));
        }
        Err(SheetsError::Credentials(
            "set store.credentials_path, store.credentials_json or store.access_token".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub telegram: Telegram,
    #[serde(default)]
    pub store: Store,
}

impl Settings {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.app.timezone.parse::<Tz>().map_err(|err| {
            ConfigError::Message(format!("invalid timezone {}: {err}", self.app.timezone))
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "catet", version, about = "Meal expense tracking bot")]
struct Args {
    /// Config file path (TOML).
    #[arg(long)]
    config: Option<String>,
}

pub fn load() -> Result<Settings, ConfigError> {
    let args = Args::parse();

    // An explicit --config must exist; the default file is optional.
    let file = match args.config.as_deref() {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
    };
    build(file, std::env::vars().collect())
}

fn build<S>(file: S, env: Map<String, String>) -> Result<Settings, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    let legacy = |var: &str| env.get(var).filter(|v| !v.trim().is_empty());

    let mut builder = Config::builder();
    for (var, key) in LEGACY_VARS {
        if let Some(value) = legacy(var) {
            builder = builder.set_default(key, value.as_str())?;
        }
    }
    if legacy("SHEET_ID").is_some() {
        builder = builder.set_default("store.kind", "sheets")?;
    }
    if let Some(key) = legacy_service_account(&env) {
        builder = builder.set_default("store.credentials_json", key)?;
    }

    let settings: Settings = builder
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("telegram.allowed_users")
                .source(Some(env)),
        )
        .build()?
        .try_deserialize()?;

    if settings.telegram.token.trim().is_empty() {
        return Err(ConfigError::Message("telegram.token is empty".to_string()));
    }
    Ok(settings)
}

/// Service-account key spread over `GS_*` variables, as JSON.
fn legacy_service_account(env: &Map<String, String>) -> Option<String> {
    let mut key = serde_json::json!({
        "client_email": env.get("GS_CLIENT_EMAIL")?,
        "private_key": env.get("GS_PRIVATE_KEY")?,
    });
    for (var, field) in [
        ("GS_PRIVATE_KEY_ID", "private_key_id"),
        ("GS_TOKEN_URI", "token_uri"),
    ] {
        if let Some(value) = env.get(var) {
            key[field] = serde_json::Value::String(value.clone());
        }
    }
    Some(key.to_string())
}
