use engine::{
    Category, ExpenseRecord, Reply, export::EXPORT_FILE_NAME, format_money, report::Report,
};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback data prefix of the category buttons.
pub(crate) const CATEGORY_PREFIX: &str = "cat:";

/// A reply ready to be sent.
#[derive(Debug)]
pub(crate) enum Outgoing {
    Text(String),
    Keyboard(String, InlineKeyboardMarkup),
    Document {
        file_name: &'static str,
        bytes: Vec<u8>,
        caption: String,
    },
}

pub(crate) fn render(reply: Reply) -> Outgoing {
    let text = match reply {
        Reply::AskUsername { first_name } => ask_username_text(first_name.as_deref()),
        Reply::InvalidUsername => format!(
            "A username must be 1 to {} characters. Please send another one.",
            engine::conversation::MAX_USERNAME_LEN
        ),
        Reply::UsernameSaved { username } => {
            format!(
                "Thanks, {username}! Your expenses will be recorded under this name.\n\n{}",
                help_text()
            )
        }
        Reply::UsernameRequired => "Please set a username with /start first.".to_string(),
        Reply::Cancelled => "Cancelled. Nothing was recorded.".to_string(),
        Reply::NothingToCancel => "Nothing to cancel.".to_string(),
        Reply::Help => help_text().to_string(),
        Reply::ChooseCategory { choices } => {
            return Outgoing::Keyboard(
                "Choose a category:".to_string(),
                category_keyboard(&choices),
            );
        }
        Reply::AskAmount { category } => ask_amount_text(&category),
        Reply::InvalidAmount { input } => format!(
            "\"{input}\" is not a valid amount. Send a positive number, e.g. 25000."
        ),
        Reply::Recorded(record) => recorded_text(&record),
        Reply::StoreFailure => {
            "Sorry, the expense sheet could not be reached. Nothing was saved, please try again later."
                .to_string()
        }
        Reply::Report(report) => report_text(&report),
        Reply::NoData { username } => format!("No expenses recorded for {username} yet."),
        Reply::Export {
            username,
            csv,
            entries,
        } => {
            return Outgoing::Document {
                file_name: EXPORT_FILE_NAME,
                bytes: csv,
                caption: format!("{entries} expenses of {username}"),
            };
        }
    };
    Outgoing::Text(text)
}

pub(crate) fn ask_amount_text(category: &Category) -> String {
    format!("Category: {category}\nHow much did you spend?")
}

fn ask_username_text(first_name: Option<&str>) -> String {
    let greeting = match first_name {
        Some(name) => format!("Hi {name}!"),
        None => "Hi!".to_string(),
    };
    format!("{greeting} I record your meal expenses.\n\nWhich username should I use for your entries?")
}

fn help_text() -> &'static str {
    "Commands:\n\
     /add - record a new expense\n\
     /report - today's and this month's spending\n\
     /export - download your expenses as CSV\n\
     /cancel - abandon the current input\n\
     /start - change your username\n\n\
     You can also send an amount directly; it is recorded under your last category."
}

fn recorded_text(record: &ExpenseRecord) -> String {
    format!(
        "✅ Recorded {} for {} on {}.",
        record.amount, record.category, record.date
    )
}

pub(crate) fn category_keyboard(choices: &[Category]) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = choices
        .iter()
        .map(|c| InlineKeyboardButton::callback(c.to_string(), format!("{CATEGORY_PREFIX}{c}")))
        .collect();
    InlineKeyboardMarkup::new(buttons.chunks(2).map(<[_]>::to_vec))
}

fn report_text(report: &Report) -> String {
    let mut text = format!("📊 Expenses of {}\n", report.user);

    text.push_str(&format!(
        "\nToday ({})\nTotal: {}\nEntries: {}",
        report.today,
        format_money(report.day.total),
        report.day.entries
    ));
    if let Some(mean) = report.day.mean {
        text.push_str(&format!("\nAverage per entry: {}", format_money(mean)));
    }

    text.push_str(&format!(
        "\n\nThis month ({})\nTotal: {}\nEntries: {}\nDays with expenses: {}",
        report.month_label(),
        format_money(report.month.total),
        report.month.entries,
        report.active_days
    ));
    if let Some(mean) = report.month.mean {
        text.push_str(&format!("\nAverage per day: {}", format_money(mean)));
    }

    text.push_str("\n\nRecent entries");
    for record in &report.recent {
        text.push_str(&format!(
            "\n{} • {} • {}",
            record.date,
            record.category,
            format_money(record.amount.value())
        ));
    }
    text
}
