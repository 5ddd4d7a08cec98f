//! Routes incoming updates to the tracker and delivers its replies.

use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use telegram_client::{BotApiError, CallbackQuery, Message, Update};
use tracing::{debug, error, info, warn};

use crate::command::{Callback, Command};
use crate::error::{BotError, Result};
use crate::sender::ChatSender;
use crate::tracker::Tracker;

/// Result of handling one update.
#[derive(Debug)]
pub enum DispatchResult {
    /// A command was answered.
    Replied { chat_id: i64 },
    /// A button press was handled.
    CallbackHandled {
        user_id: i64,
        /// Whether a partner notification went out.
        notified: bool,
    },
    /// Nothing to do.
    Skipped { reason: String },
    /// Delivery failed.
    Error(BotError),
}

/// Handles one update at a time.
pub struct Dispatcher {
    tracker: Arc<Tracker>,
    sender: Arc<dyn ChatSender>,
}

impl Dispatcher {
    pub fn new(tracker: Arc<Tracker>, sender: Arc<dyn ChatSender>) -> Self {
        Self { tracker, sender }
    }

    pub async fn handle_update(&self, update: &Update) -> DispatchResult {
        if let Some(query) = &update.callback_query {
            return self.handle_callback_query(query).await;
        }
        if let Some(message) = &update.message {
            return self.handle_message(message).await;
        }
        DispatchResult::Skipped {
            reason: format!("update {} has no message or callback", update.update_id),
        }
    }

    async fn handle_message(&self, message: &Message) -> DispatchResult {
        let Some(text) = message.text.as_deref() else {
            return DispatchResult::Skipped {
                reason: "message without text".to_string(),
            };
        };
        let Some(command) = Command::parse(text) else {
            return DispatchResult::Skipped {
                reason: "not a command".to_string(),
            };
        };
        let Some(from) = &message.from else {
            return DispatchResult::Skipped {
                reason: "message without sender".to_string(),
            };
        };

        let chat_id = message.chat.id;
        let reply = self.tracker.handle_command(from.id, &command).await;
        match self.sender.send_message(chat_id, &reply).await {
            Ok(()) => DispatchResult::Replied { chat_id },
            Err(e) => DispatchResult::Error(e),
        }
    }

    async fn handle_callback_query(&self, query: &CallbackQuery) -> DispatchResult {
        let callback = query
            .data
            .as_deref()
            .map(Callback::parse)
            .unwrap_or(Callback::Unknown);
        let user_id = query.from.id;
        let outcome = self.tracker.handle_callback(user_id, &callback).await;

        // The toggle is already saved, so later deliveries go ahead even if
        // an earlier one fails.
        if let Err(e) = self
            .sender
            .answer_callback(&query.id, outcome.answer.as_deref())
            .await
        {
            warn!(user_id = %user_id, "Error answering callback: {}", e);
        }

        if let Some(reply) = &outcome.edit {
            match &query.message {
                Some(message) => {
                    if let Err(e) = self
                        .sender
                        .edit_message(message.chat.id, message.message_id, reply)
                        .await
                    {
                        warn!(user_id = %user_id, "Error editing callback message: {}", e);
                    }
                }
                None => debug!("Callback message no longer available, skipping edit"),
            }
        }

        let mut notified = false;
        if let Some(note) = &outcome.notification {
            let reply = crate::render::Reply::plain(&note.text);
            match self.sender.send_message(note.chat_id, &reply).await {
                Ok(()) => notified = true,
                Err(e) => warn!(partner_id = %note.chat_id, "Error sending notification: {}", e),
            }
        }

        DispatchResult::CallbackHandled { user_id, notified }
    }

    fn log_result(result: DispatchResult) {
        match result {
            DispatchResult::Replied { chat_id } => debug!("Replied to chat {}", chat_id),
            DispatchResult::CallbackHandled { user_id, notified } => {
                debug!(user_id = %user_id, notified, "Callback handled")
            }
            DispatchResult::Skipped { reason } => debug!("Skipped: {}", reason),
            DispatchResult::Error(e) => warn!("Error handling update: {}", e),
        }
    }

    /// Handle updates until the stream ends.
    pub async fn run<S>(self, mut stream: S) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Update, BotApiError>> + Unpin,
    {
        info!("Starting dispatcher");

        while let Some(result) = stream.next().await {
            match result {
                Ok(update) => Self::log_result(self.handle_update(&update).await),
                Err(e) => error!("Update stream error: {}", e),
            }
        }

        warn!("Update stream ended");
        Err(BotError::StreamEnded)
    }

    /// Handle updates until `shutdown_signal` resolves or the stream ends.
    pub async fn run_with_shutdown<S, F>(self, mut stream: S, shutdown_signal: F) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Update, BotApiError>> + Unpin,
        F: Future<Output = ()> + Send,
    {
        info!("Starting dispatcher (graceful shutdown enabled)");

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping dispatcher");
                    return Ok(());
                }

                result = stream.next() => {
                    match result {
                        Some(Ok(update)) => Self::log_result(self.handle_update(&update).await),
                        Some(Err(e)) => error!("Update stream error: {}", e),
                        None => {
                            warn!("Update stream ended");
                            return Err(BotError::StreamEnded);
                        }
                    }
                }
            }
        }
    }
}
