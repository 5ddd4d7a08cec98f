//! Telegram Bot API HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::error::BotApiError;
use crate::types::{
    AnswerCallbackQueryParams, ApiResponse, DeleteWebhookParams, EditMessageTextParams,
    GetUpdatesParams, InlineKeyboardMarkup, Message, ParseMode, SendMessageParams, Update, User,
};

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct BotClient {
    http: Client,
    config: BotConfig,
    connected: Arc<AtomicBool>,
}

impl BotClient {
    /// Create a client without contacting the API.
    pub fn new(config: BotConfig) -> Result<Self, BotApiError> {
        if !config.has_token() {
            return Err(BotApiError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(BotApiError::Http)?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a client and verify the token with `getMe`.
    pub async fn connect(config: BotConfig) -> Result<Self, BotApiError> {
        let client = Self::new(config)?;

        let me = client.get_me().await.map_err(|e| match e {
            BotApiError::Api { description, .. } => BotApiError::Unauthorized(description),
            other => other,
        })?;
        client.connected.store(true, Ordering::SeqCst);
        info!(
            "Connected to Telegram Bot API as @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        Ok(client)
    }

    /// Whether the last API call succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Fetch the bot's own user record.
    pub async fn get_me(&self) -> Result<User, BotApiError> {
        self.api_call::<(), _>("getMe", None).await
    }

    /// Fetch pending updates, blocking server-side up to the poll timeout.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        allowed_updates: &[&str],
    ) -> Result<Vec<Update>, BotApiError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.config.poll_timeout.as_secs(),
            allowed_updates: allowed_updates.iter().map(|s| s.to_string()).collect(),
        };
        self.api_call("getUpdates", Some(params)).await
    }

    /// Remove any webhook so long polling works, optionally discarding the backlog.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, BotApiError> {
        let params = DeleteWebhookParams {
            drop_pending_updates,
        };
        self.api_call("deleteWebhook", Some(params)).await
    }

    /// Send a message using the full parameter structure.
    pub async fn send_message(&self, params: SendMessageParams) -> Result<Message, BotApiError> {
        self.api_call("sendMessage", Some(params)).await
    }

    /// Send a plain text message to a chat.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message, BotApiError> {
        self.send_message(SendMessageParams::text(chat_id, text)).await
    }

    /// Replace the text (and keyboard) of a message the bot sent earlier.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotApiError> {
        let params = EditMessageTextParams {
            chat_id,
            message_id,
            text: text.to_string(),
            parse_mode,
            reply_markup,
        };
        // Returns the edited Message, or `true` for inline messages
        let _: serde_json::Value = self.api_call("editMessageText", Some(params)).await?;
        Ok(())
    }

    /// Acknowledge a callback query, optionally showing a toast to the user.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), BotApiError> {
        let params = AnswerCallbackQueryParams {
            callback_query_id: callback_query_id.to_string(),
            text: text.map(str::to_string),
        };
        let _: bool = self.api_call("answerCallbackQuery", Some(params)).await?;
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Call a Bot API method.
    async fn api_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, BotApiError> {
        debug!("API call: {}", method);

        let mut request = self.http.post(self.config.method_url(method));
        if let Some(params) = params {
            request = request.json(&params);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                // reqwest errors embed the URL, which carries the token
                return Err(BotApiError::Http(e.without_url()));
            }
        };

        // Error statuses still carry a JSON body with a description
        let body = response.text().await.map_err(|e| BotApiError::Http(e.without_url()))?;
        let api_response: ApiResponse<R> = serde_json::from_str(&body)?;
        self.connected.store(true, Ordering::SeqCst);

        if !api_response.ok {
            return Err(BotApiError::Api {
                code: api_response.error_code.unwrap_or(-1),
                description: api_response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        api_response.result.ok_or_else(|| BotApiError::Api {
            code: -1,
            description: format!("no result in {} response", method),
        })
    }
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("api_url", &self.config.api_url)
            .field("connected", &self.is_connected())
            .finish()
    }
}
