//! Outgoing message transport.

use std::sync::Mutex;

use async_trait::async_trait;
use telegram_client::{BotClient, SendMessageParams};

use crate::error::BotError;
use crate::render::Reply;

/// Delivers replies to chats.
///
/// Abstracted so handlers and the scheduler can run against Telegram or a
/// recording double in tests.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send a new message to a chat.
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError>;

    /// Replace an earlier bot message.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), BotError>;

    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>)
        -> Result<(), BotError>;
}

/// Sends through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramSender {
    client: BotClient,
}

impl TelegramSender {
    pub fn new(client: BotClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError> {
        let mut params = SendMessageParams::text(chat_id, &reply.text);
        if let Some(mode) = reply.parse_mode {
            params = params.with_parse_mode(mode);
        }
        if let Some(keyboard) = &reply.keyboard {
            params = params.with_keyboard(keyboard.clone());
        }

        self.client
            .send_message(params)
            .await
            .map_err(|e| BotError::SendFailed(format!("chat {}: {}", chat_id, e)))?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), BotError> {
        self.client
            .edit_message_text(
                chat_id,
                message_id,
                &reply.text,
                reply.parse_mode,
                reply.keyboard.clone(),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), BotError> {
        self.client.answer_callback_query(callback_id, text).await?;
        Ok(())
    }
}

/// Something a [`RecordingSender`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SentItem {
    Message { chat_id: i64, reply: Reply },
    Edit { chat_id: i64, message_id: i64, reply: Reply },
    Answer { callback_id: String, text: Option<String> },
}

/// Records every call instead of sending. Chats listed in `failing` error out.
#[derive(Debug, Default)]
pub struct RecordingSender {
    items: Mutex<Vec<SentItem>>,
    failing: Vec<i64>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose messages to `chat_ids` fail.
    pub fn failing_for(chat_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            failing: chat_ids.into_iter().collect(),
        }
    }

    pub fn items(&self) -> Vec<SentItem> {
        self.lock().clone()
    }

    /// New messages only, as `(chat_id, text)`.
    pub fn messages(&self) -> Vec<(i64, String)> {
        self.lock()
            .iter()
            .filter_map(|item| match item {
                SentItem::Message { chat_id, reply } => Some((*chat_id, reply.text.clone())),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SentItem>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError> {
        if self.failing.contains(&chat_id) {
            return Err(BotError::SendFailed(format!("chat {} unreachable", chat_id)));
        }
        self.lock().push(SentItem::Message {
            chat_id,
            reply: reply.clone(),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        reply: &Reply,
    ) -> Result<(), BotError> {
        self.lock().push(SentItem::Edit {
            chat_id,
            message_id,
            reply: reply.clone(),
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), BotError> {
        self.lock().push(SentItem::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sender() {
        let sender = RecordingSender::failing_for([7]);

        sender.send_message(1, &Reply::plain("hi")).await.unwrap();
        sender.answer_callback("cb", Some("ok")).await.unwrap();
        assert!(sender.send_message(7, &Reply::plain("lost")).await.is_err());

        assert_eq!(sender.messages(), vec![(1, "hi".to_string())]);
        assert_eq!(sender.items().len(), 2);
    }
}
