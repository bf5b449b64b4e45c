//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Task provider request failed.
    #[error("task provider error: {0}")]
    Provider(String),

    /// HTTP transport error talking to the task provider.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Core engine failure (storage path, not user-facing conflicts).
    #[error("engine error: {0}")]
    Engine(#[from] worklog_core::EngineError),

    /// Roster could not be loaded at startup.
    #[error("roster error: {0}")]
    Roster(#[from] worklog_core::roster::RosterError),

    /// Recipient has no known chat id yet.
    #[error("no chat id known for {0}; the member must message the bot once")]
    NoChatId(String),

    /// Telegram API error.
    #[error("telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
