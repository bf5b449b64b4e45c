//! Telegram bot interface for Worklog.
//!
//! The bot lets team members track time from chat and receive a weekday
//! morning digest of their day ahead.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `ASANA_TOKEN`: task provider API token (task lists empty without it)
//! - `ASANA_PROJECT`: task provider project id
//! - `WORKLOG_STATE_DIR`: state directory (default: `~/.worklog`)
//! - `WORKLOG_UTC_OFFSET_HOURS`: reporting timezone offset (default: 3)
//! - `WORKLOG_DIGEST_TIME`: digest time as HH:MM (default: 10:30)
//! - `WORKLOG_DIGEST_RECIPIENTS`: comma-separated roster handles
//! - `WORKLOG_ROSTER_FILE`: roster path (default: `<state>/roster.json`)
//!
//! # Commands
//!
//! - `/begin <task>` - start tracking a task
//! - `/done [notes]` - stop the current task
//! - `/status` - show the currently tracked task
//! - `/today`, `/week` - per-task and per-day totals
//! - `/tasks [query]`, `/overdue` - open tasks from the task provider
//! - `/newtask <name>` - create a task in the task provider

pub mod bot;
pub mod error;
pub mod format;
pub mod handlers;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod tasks;

pub use bot::{bot_from_env, WorklogBot};
pub use error::{BotError, Result};
pub use sink::TelegramSink;
pub use state::BotState;
pub use tasks::AsanaTasks;
