use engine::{Event, Reply};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, InputFile, User},
};

use crate::{
    ConfigParameters,
    commands::{looks_like_command, parse_command},
    ui::{self, CATEGORY_PREFIX, Outgoing},
};

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }

    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let event = match parse_command(text) {
        Some(cmd) => cmd.into_event(from),
        None if looks_like_command(text) => {
            tracing::debug!("ignoring unknown command from {}: {text}", from.id);
            return Ok(());
        }
        None => Event::Text(text.to_string()),
    };

    let reply = cfg.engine.handle(from.id.0, event).await;
    send_reply(&bot, msg.chat.id, reply).await
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    if let Err(err) = bot.answer_callback_query(q.id.clone()).await {
        tracing::debug!("failed to answer callback query: {err}");
    }

    let Some(label) = q
        .data
        .as_deref()
        .and_then(|data| data.strip_prefix(CATEGORY_PREFIX))
    else {
        tracing::warn!("unknown callback data {:?}", q.data);
        return Ok(());
    };

    let reply = cfg
        .engine
        .handle(q.from.id.0, Event::CategoryChosen(label.to_string()))
        .await;

    // The category prompt turns into the amount prompt, dropping its buttons.
    if let Reply::AskAmount { category } = &reply
        && bot
            .edit_message_text(chat_id, message.id(), ui::ask_amount_text(category))
            .await
            .is_ok()
    {
        return Ok(());
    }

    send_reply(&bot, chat_id, reply).await
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    match ui::render(reply) {
        Outgoing::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Outgoing::Keyboard(text, keyboard) => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        Outgoing::Document {
            file_name,
            bytes,
            caption,
        } => {
            bot.send_document(chat_id, InputFile::memory(bytes).file_name(file_name))
                .caption(caption)
                .await?;
        }
    }
    Ok(())
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}
