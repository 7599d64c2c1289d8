//! Conversation state machine.
//!
//! [`transition`] is pure: given a session and an inbound event it returns
//! the next session and one [`Effect`]. Effects that touch the record store
//! are executed by [`Engine`](crate::Engine).
use crate::{
    Amount, Category, EngineError, ExpenseRecord,
    report::Report,
    session::{ConvState, Session},
};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Inbound chat event, already decoded by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// `/start`, with the chat first name when the transport knows it.
    Start { first_name: Option<String> },
    Cancel,
    Help,
    /// Entry command: begin recording an expense.
    NewExpense,
    Report,
    Export,
    /// A category button was pressed.
    CategoryChosen(String),
    /// Free text that is not a command.
    Text(String),
}

/// Outcome of an event, rendered by the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    AskUsername { first_name: Option<String> },
    InvalidUsername,
    UsernameSaved { username: String },
    /// An entry point was used before onboarding.
    UsernameRequired,
    Cancelled,
    NothingToCancel,
    Help,
    ChooseCategory { choices: Vec<Category> },
    AskAmount { category: Category },
    InvalidAmount { input: String },
    /// The store acknowledged the new record.
    Recorded(ExpenseRecord),
    /// The store failed; nothing was confirmed.
    StoreFailure,
    Report(Report),
    NoData { username: String },
    Export { username: String, csv: Vec<u8>, entries: usize },
}

/// Work left to do after a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Reply(Reply),
    RecordExpense {
        amount: Amount,
        category: Category,
        user: String,
    },
    BuildReport { user: String },
    Export { user: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub session: Session,
    pub effect: Effect,
}

impl Step {
    fn reply(session: Session, reply: Reply) -> Self {
        Self {
            session,
            effect: Effect::Reply(reply),
        }
    }
}

/// Computes the next session and the effect of `event`.
pub fn transition(session: &Session, event: Event) -> Step {
    let mut next = session.clone();

    match event {
        Event::Start { first_name } => {
            next.state = ConvState::AwaitingUsername;
            Step::reply(next, Reply::AskUsername { first_name })
        }
        Event::Cancel => {
            if session.state == ConvState::Idle {
                return Step::reply(next, Reply::NothingToCancel);
            }
            next.state = ConvState::Idle;
            Step::reply(next, Reply::Cancelled)
        }
        Event::Help => Step::reply(next, Reply::Help),
        Event::Text(text) if session.state == ConvState::AwaitingUsername => {
            match normalize_username(&text) {
                Ok(username) => {
                    next.username = Some(username.clone());
                    next.state = ConvState::Idle;
                    Step::reply(next, Reply::UsernameSaved { username })
                }
                Err(err) => {
                    tracing::debug!("{err}");
                    Step::reply(next, Reply::InvalidUsername)
                }
            }
        }
        event => {
            let Some(user) = session.username.clone() else {
                return Step::reply(next, Reply::UsernameRequired);
            };
            registered(next, user, event)
        }
    }
}

// Events that require a username.
fn registered(mut next: Session, user: String, event: Event) -> Step {
    match event {
        Event::NewExpense => {
            next.state = ConvState::AwaitingCategory;
            Step::reply(
                next,
                Reply::ChooseCategory {
                    choices: Category::choices(),
                },
            )
        }
        Event::CategoryChosen(label) => {
            let category = Category::new(label);
            next.category = Some(category.clone());
            next.state = ConvState::AwaitingAmount;
            Step::reply(next, Reply::AskAmount { category })
        }
        Event::Report => {
            next.state = ConvState::Idle;
            Step {
                session: next,
                effect: Effect::BuildReport { user },
            }
        }
        Event::Export => {
            next.state = ConvState::Idle;
            Step {
                session: next,
                effect: Effect::Export { user },
            }
        }
        Event::Text(text) => match text.parse::<Amount>() {
            Ok(amount) => {
                let category = next.category.clone().unwrap_or_default();
                next.state = ConvState::Idle;
                Step {
                    session: next,
                    effect: Effect::RecordExpense {
                        amount,
                        category,
                        user,
                    },
                }
            }
            Err(_) => Step::reply(
                next,
                Reply::InvalidAmount {
                    input: text.trim().to_string(),
                },
            ),
        },
        // Handled before the username check.
        Event::Start { .. } | Event::Cancel | Event::Help => Step::reply(next, Reply::Help),
    }
}

/// Trims a username and rejects empty or overlong ones.
pub fn normalize_username(raw: &str) -> Result<String, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(EngineError::InvalidUsername(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
