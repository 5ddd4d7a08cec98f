//! Two-person daily accountability bot.
//!
//! Two fixed users each have a checklist of daily tasks. They tick tasks
//! off from a Telegram inline keyboard, the partner hears about it when a
//! day's list is finished, and on the last day of every month both get a
//! report saying who was more consistent.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use accountability_bot::{
//!     Config, Dispatcher, SystemClock, TelegramSender, Tracker,
//! };
//! use telegram_client::{subscribe, BotClient};
//! use tracker_store::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let client = BotClient::connect(config.bot_config()).await?;
//!
//! let tracker = Arc::new(Tracker::new(
//!     Arc::new(Store::open(&config.data_dir)),
//!     Arc::new(config.registry.clone()),
//!     Arc::new(SystemClock),
//! ));
//! let dispatcher = Dispatcher::new(tracker, Arc::new(TelegramSender::new(client.clone())));
//!
//! dispatcher
//!     .run_with_shutdown(subscribe(&client), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod mailer;
pub mod render;
pub mod report;
pub mod scheduler;
pub mod sender;
pub mod tracker;
pub mod users;

pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{Callback, Command};
pub use config::{Config, ConfigError};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use error::{BotError, Result};
pub use mailer::{MailConfig, MailError, ReportMailer};
pub use render::Reply;
pub use report::{MonthlyReport, Rate, UserMonthStats, Verdict};
pub use scheduler::{MonthlyReporter, TickOutcome};
pub use sender::{ChatSender, RecordingSender, TelegramSender};
pub use tracker::{CallbackOutcome, Notification, Tracker};
pub use users::{User, UserRegistry};
