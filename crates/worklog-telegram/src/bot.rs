//! Bot wiring: token, dispatcher, background scheduler.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tracing::{info, warn};
use worklog_core::digest::DigestService;

use crate::error::{BotError, Result};
use crate::handlers::{handle_command, Command};
use crate::scheduler::run_digest_scheduler;
use crate::state::BotState;

/// Builds the teloxide bot from `TELEGRAM_BOT_TOKEN`.
pub fn bot_from_env() -> Result<Bot> {
    let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| BotError::NoToken)?;
    Ok(Bot::new(token))
}

/// The worklog Telegram bot.
pub struct WorklogBot {
    bot: Bot,
    state: Arc<BotState>,
    digest: Arc<DigestService>,
}

impl WorklogBot {
    pub fn new(bot: Bot, state: Arc<BotState>, digest: Arc<DigestService>) -> Self {
        Self { bot, state, digest }
    }

    /// Runs the bot in long-polling mode until interrupted.
    ///
    /// The digest scheduler runs as a background task beside the
    /// dispatcher; it never blocks command handling.
    pub async fn run(self) {
        let state = Arc::clone(&self.state);

        tokio::spawn(run_digest_scheduler(
            self.digest,
            state.clock(),
            state.config().clone(),
        ));

        let state_for_commands = Arc::clone(&state);
        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Commands that start with / but did not parse.
                        msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            bot.send_message(
                                msg.chat.id,
                                format!(
                                    "Unknown command: {}\n\nUse /help to see available commands.",
                                    text.split_whitespace().next().unwrap_or(text)
                                ),
                            )
                            .await?;
                        }
                        Ok(())
                    }),
            );

        info!("bot is running, send /start to begin");

        Dispatcher::builder(self.bot, handler)
            .default_handler(|upd| async move {
                warn!("unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}
