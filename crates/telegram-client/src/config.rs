//! Configuration types for telegram-client.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for connecting to the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org").
    pub api_url: String,
    /// Bot token issued by BotFather.
    token: SecretString,
    /// Server-side wait for `getUpdates` long polling.
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Create a new configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: SecretString::from(token.into()),
            poll_timeout: Duration::from_secs(30),
        }
    }

    /// Point the client at a different Bot API server (self-hosted or mock).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the long polling timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Whether a token is present at all.
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }

    /// Get the URL for a Bot API method (exposes the token).
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.expose_secret(), method)
    }

    /// HTTP timeout for a single request; long polls need headroom past `poll_timeout`.
    pub fn request_timeout(&self) -> Duration {
        self.poll_timeout + Duration::from_secs(10)
    }
}
