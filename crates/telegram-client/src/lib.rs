//! Telegram Bot API client library.
//!
//! This crate provides a Rust client for the Telegram Bot HTTP API. It supports:
//!
//! - Sending and editing messages, with inline keyboards
//! - Answering callback queries from inline buttons
//! - Receiving updates via `getUpdates` long polling, exposed as a `Stream`
//!
//! # Example
//!
//! ```no_run
//! use telegram_client::{BotClient, BotConfig};
//!
//! # async fn example() -> Result<(), telegram_client::BotApiError> {
//! let config = BotConfig::new("123456:ABC-token");
//! let client = BotClient::connect(config).await?;
//!
//! // Send a message
//! let sent = client.send_text(42, "Hello!").await?;
//! println!("Sent message {}", sent.message_id);
//!
//! // Receive updates
//! use futures::StreamExt;
//! let mut updates = telegram_client::subscribe(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => {
//!             if let Some(message) = update.message {
//!                 println!("From {}: {:?}", message.chat.id, message.text);
//!             }
//!         }
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::BotClient;
pub use config::BotConfig;
pub use error::BotApiError;
pub use poll::{subscribe, UpdateStream};
pub use types::*;
