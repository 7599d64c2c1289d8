//! Command menu and parsing

use engine::Event;
use teloxide::{types::User, utils::command::BotCommands};

/// Commands shown in the Telegram menu.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Meal expense commands:")]
pub enum Command {
    #[command(description = "Set your username.")]
    Start,
    #[command(description = "Record a new expense.")]
    Add,
    #[command(description = "Show today's and this month's spending.")]
    Report,
    #[command(description = "Download your expenses as CSV.")]
    Export,
    #[command(description = "Abandon the current input.")]
    Cancel,
    #[command(description = "Show this message.")]
    Help,
}

impl Command {
    pub(crate) fn into_event(self, from: &User) -> Event {
        match self {
            Command::Start => Event::Start {
                first_name: Some(from.first_name.clone()).filter(|name| !name.trim().is_empty()),
            },
            Command::Add => Event::NewExpense,
            Command::Report => Event::Report,
            Command::Export => Event::Export,
            Command::Cancel => Event::Cancel,
            Command::Help => Event::Help,
        }
    }
}

/// Parses the leading `/command` of a message, ignoring a `@botname` suffix
/// and any arguments. `/catat` and `/laporan` are accepted for the old
/// Indonesian commands.
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let name = trimmed.strip_prefix('/')?.split_whitespace().next()?;
    let name = name.split('@').next().unwrap_or(name).to_lowercase();

    match name.as_str() {
        "start" => Some(Command::Start),
        "add" | "catat" => Some(Command::Add),
        "report" | "laporan" => Some(Command::Report),
        "export" => Some(Command::Export),
        "cancel" => Some(Command::Cancel),
        "help" => Some(Command::Help),
        _ => None,
    }
}

pub(crate) fn looks_like_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}
