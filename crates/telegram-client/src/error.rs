//! Error types for telegram-client.

use thiserror::Error;

/// Errors that can occur when talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum BotApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api { code: i32, description: String },

    /// The token was rejected or `getMe` failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
