//! Error types for the bot.

use telegram_client::BotApiError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::mailer::MailError;

/// Errors that can occur while running the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram API error.
    #[error("telegram error: {0}")]
    Api(#[from] BotApiError),

    /// Outgoing message could not be delivered.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Report email could not be delivered.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Health server or other I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The update stream ended.
    #[error("update stream ended")]
    StreamEnded,
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
