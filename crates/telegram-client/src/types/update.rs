//! Update and message types received from the Bot API.

use serde::{Deserialize, Serialize};

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier, used as the polling offset.
    pub update_id: i64,

    /// New incoming message.
    #[serde(default)]
    pub message: Option<Message>,

    /// Inline button press.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A Telegram message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier inside its chat.
    pub message_id: i64,

    /// Sender, absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,

    /// Chat the message belongs to.
    pub chat: Chat,

    /// Unix time the message was sent.
    #[serde(default)]
    pub date: i64,

    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,

    /// Whether this user is a bot.
    #[serde(default)]
    pub is_bot: bool,

    /// First name.
    #[serde(default)]
    pub first_name: String,

    /// Username without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier. For private chats this equals the user id.
    pub id: i64,

    /// "private", "group", "supergroup" or "channel".
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Identifier to pass to `answerCallbackQuery`.
    pub id: String,

    /// Who pressed the button.
    pub from: User,

    /// Message carrying the keyboard, if it is still available.
    #[serde(default)]
    pub message: Option<Message>,

    /// The button's `callback_data`.
    #[serde(default)]
    pub data: Option<String>,
}

impl Update {
    /// Id of the user who caused this update, if any.
    pub fn sender_id(&self) -> Option<i64> {
        if let Some(query) = &self.callback_query {
            return Some(query.from.id);
        }
        self.message
            .as_ref()
            .and_then(|m| m.from.as_ref())
            .map(|u| u.id)
    }
}
