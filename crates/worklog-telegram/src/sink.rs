//! Message delivery over the Telegram API.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;
use worklog_core::digest::{CollaboratorError, MessageSink};
use worklog_core::Roster;

use crate::error::BotError;

/// Telegram caps messages at 4096 chars; stay under with headroom.
const MAX_MESSAGE_LEN: usize = 4000;

/// Delivers digest messages to roster members' chats.
pub struct TelegramSink {
    bot: Bot,
    roster: Arc<Roster>,
}

impl TelegramSink {
    pub fn new(bot: Bot, roster: Arc<Roster>) -> Self {
        Self { bot, roster }
    }
}

/// Truncates to the Telegram message limit on a char boundary.
pub fn truncate_message(text: &str) -> &str {
    if text.len() <= MAX_MESSAGE_LEN {
        return text;
    }
    let mut end = MAX_MESSAGE_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), CollaboratorError> {
        let member = self
            .roster
            .find_by_handle(recipient)
            .ok_or_else(|| format!("recipient {} not in roster", recipient))?;
        let chat_id = member
            .chat_id
            .ok_or_else(|| BotError::NoChatId(recipient.to_string()))?;

        self.bot
            .send_message(ChatId(chat_id), truncate_message(text))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(BotError::Telegram)?;

        debug!(recipient, chat_id, len = text.len(), "digest message sent");
        Ok(())
    }
}
