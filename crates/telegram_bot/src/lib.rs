//! Telegram bot.
//!
//! The bot is a thin transport: it turns updates into [`engine::Event`]s,
//! lets the [`Engine`] decide, and renders the replies.

use engine::Engine;
use teloxide::{prelude::*, utils::command::BotCommands};

pub use commands::Command;
pub use teloxide::types::UserId;

mod commands;
mod handlers;
mod ui;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("telegram token is missing")]
    MissingToken,
    #[error("no engine configured")]
    MissingEngine,
}

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    engine: Engine,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Engine,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("failed to register the command menu: {err}");
        }

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            engine: self.engine.clone(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Option<Engine>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.trim().to_string();
        self
    }

    /// Restricts the bot to these users. An empty list allows everyone.
    pub fn allowed_users(mut self, allowed_users: Vec<UserId>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users);
        }
        self
    }

    pub fn engine(mut self, engine: Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Bot, BotError> {
        tracing::info!("Initializing telegram bot...");
        if self.token.is_empty() {
            return Err(BotError::MissingToken);
        }
        let engine = self.engine.ok_or(BotError::MissingEngine)?;

        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            engine,
        })
    }
}
