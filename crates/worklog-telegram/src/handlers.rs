//! Command handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{error, info};
use worklog_core::EngineError;
use worklog_core::TeamMember;

use crate::format;
use crate::state::BotState;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Start tracking a task: /begin <task name>")]
    Begin(String),

    #[command(description = "Stop the current task, with optional notes: /done [notes]")]
    Done(String),

    #[command(description = "Show the currently tracked task")]
    Status,

    #[command(description = "Today's tracked time per task")]
    Today,

    #[command(description = "Tracked time for the last 7 days")]
    Week,

    #[command(description = "Your open tasks, or search: /tasks [query]")]
    Tasks(String),

    #[command(description = "Your overdue tasks")]
    Overdue,

    #[command(description = "Create a task in the tracker: /newtask <name>")]
    Newtask(String),
}

/// Dispatches a parsed command to its handler.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Begin(task) => handle_begin(bot, msg, state, task).await,
        Command::Done(notes) => handle_done(bot, msg, state, notes).await,
        Command::Status => handle_status(bot, msg, state).await,
        Command::Today => handle_today(bot, msg, state).await,
        Command::Week => handle_week(bot, msg, state).await,
        Command::Tasks(query) => handle_tasks(bot, msg, state, query).await,
        Command::Overdue => handle_overdue(bot, msg, state).await,
        Command::Newtask(name) => handle_newtask(bot, msg, state, name).await,
    }
}

/// Resolves the sender against the roster, replying if unknown.
async fn require_member<'a>(
    bot: &Bot,
    msg: &Message,
    state: &'a BotState,
) -> ResponseResult<Option<&'a TeamMember>> {
    match state.member_for(msg) {
        Some(member) => Ok(Some(member)),
        None => {
            bot.send_message(
                msg.chat.id,
                "You are not on the team roster. Ask an admin to add your handle.",
            )
            .await?;
            Ok(None)
        }
    }
}

async fn reply_html(bot: &Bot, msg: &Message, text: &str) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Generic reply for storage-level failures; details go to the log only.
async fn reply_storage_error(
    bot: &Bot,
    msg: &Message,
    op: &str,
    err: EngineError,
) -> ResponseResult<()> {
    error!(op, error = %err, "command failed on storage");
    bot.send_message(
        msg.chat.id,
        "Something went wrong saving your data. Please try again.",
    )
    .await?;
    Ok(())
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let welcome = "Welcome to the worklog bot! ⏱\n\n\
        <b>Getting started:</b>\n\
        1. /begin &lt;task&gt; to start tracking\n\
        2. /done [notes] when you finish\n\
        3. /today or /week for your totals\n\
        4. /tasks and /overdue for your task list\n\n\
        Type /help for all commands.";
    reply_html(&bot, &msg, welcome).await?;

    info!(
        chat_id = %msg.chat.id,
        known = state.member_for(&msg).is_some(),
        "user started bot"
    );
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Handle the /begin command.
pub async fn handle_begin(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    task: String,
) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    match state.engine().start(&member.user_id, &task, None) {
        Ok(session) => reply_html(&bot, &msg, &format::format_started(&session)).await,
        Err(EngineError::EmptyTaskName) => {
            bot.send_message(msg.chat.id, "Usage: /begin <task name>")
                .await?;
            Ok(())
        }
        Err(EngineError::AlreadyActive(existing)) => {
            reply_html(
                &bot,
                &msg,
                &format!(
                    "You are already tracking <b>{}</b>. Send /done first.",
                    escape(&existing.task_name)
                ),
            )
            .await
        }
        Err(e) => reply_storage_error(&bot, &msg, "begin", e).await,
    }
}

/// Handle the /done command.
pub async fn handle_done(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    notes: String,
) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let notes = notes.trim();
    let notes = (!notes.is_empty()).then(|| notes.to_string());

    match state.engine().stop(&member.user_id, notes) {
        Ok(session) => reply_html(&bot, &msg, &format::format_stopped(&session)).await,
        Err(EngineError::NoActiveSession) => {
            bot.send_message(
                msg.chat.id,
                "Nothing is being tracked. Start with /begin <task>.",
            )
            .await?;
            Ok(())
        }
        Err(e) => reply_storage_error(&bot, &msg, "done", e).await,
    }
}

/// Handle the /status command.
pub async fn handle_status(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    match state.engine().status(&member.user_id) {
        Ok(info) => reply_html(&bot, &msg, &format::format_status(info.as_ref())).await,
        Err(e) => reply_storage_error(&bot, &msg, "status", e).await,
    }
}

/// Handle the /today command.
pub async fn handle_today(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    match state.aggregator().daily_summary(&member.user_id, state.today()) {
        Ok(summary) => reply_html(&bot, &msg, &format::format_daily(&summary)).await,
        Err(e) => reply_storage_error(&bot, &msg, "today", e).await,
    }
}

/// Handle the /week command. Reports the 7 days ending today.
pub async fn handle_week(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let from = state.today() - chrono::Duration::days(6);
    match state.aggregator().weekly_summary(&member.user_id, from) {
        Ok(summary) => reply_html(&bot, &msg, &format::format_weekly(&summary)).await,
        Err(e) => reply_storage_error(&bot, &msg, "week", e).await,
    }
}

/// Handle the /tasks command.
pub async fn handle_tasks(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    query: String,
) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let query = query.trim();
    let (title, result) = if query.is_empty() {
        (
            "Your open tasks".to_string(),
            state
                .provider()
                .list_tasks(member.provider_assignee.as_deref())
                .await,
        )
    } else {
        (
            format!("Tasks matching \"{}\"", query),
            state.provider().search_tasks(query).await,
        )
    };

    match result {
        Ok(tasks) => {
            reply_html(&bot, &msg, &format::format_task_list(&title, &tasks, state.today())).await
        }
        Err(e) => {
            error!(error = %e, "task list fetch failed");
            bot.send_message(msg.chat.id, "Could not reach the task tracker. Try again later.")
                .await?;
            Ok(())
        }
    }
}

/// Handle the /newtask command.
pub async fn handle_newtask(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    name: String,
) -> ResponseResult<()> {
    let Some(_member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let name = name.trim();
    if name.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /newtask <task name>")
            .await?;
        return Ok(());
    }

    match state.provider().create_task(name).await {
        Ok(ref_id) => {
            info!(%ref_id, "task created in provider");
            reply_html(
                &bot,
                &msg,
                &format!("✅ Created <b>{}</b> in the tracker.", escape(name)),
            )
            .await
        }
        Err(e) => {
            error!(error = %e, "task creation failed");
            bot.send_message(msg.chat.id, "Could not create the task. Try again later.")
                .await?;
            Ok(())
        }
    }
}

/// Handle the /overdue command.
pub async fn handle_overdue(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(member) = require_member(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let today = state.today();
    match state
        .provider()
        .list_tasks(member.provider_assignee.as_deref())
        .await
    {
        Ok(tasks) => {
            let overdue: Vec<_> = tasks.into_iter().filter(|t| t.is_overdue(today)).collect();
            reply_html(
                &bot,
                &msg,
                &format::format_task_list("Overdue tasks", &overdue, today),
            )
            .await
        }
        Err(e) => {
            error!(error = %e, "overdue fetch failed");
            bot.send_message(msg.chat.id, "Could not reach the task tracker. Try again later.")
                .await?;
            Ok(())
        }
    }
}
