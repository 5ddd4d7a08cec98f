//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use telegram_client::BotConfig;
use tracker_store::UserId;

use crate::command::{Callback, MAX_CALLBACK_DATA_LEN};
use crate::mailer::MailConfig;
use crate::users::UserRegistry;

const DEFAULT_FIRST_TASKS: &str = "Exercise,Studies,Reading";
const DEFAULT_SECOND_TASKS: &str = "Physics,Chemistry,Maths";

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    bot_token: SecretString,
    /// Bot API base URL.
    pub api_url: String,
    /// The two participants.
    pub registry: UserRegistry,
    /// Directory holding the JSON documents.
    pub data_dir: PathBuf,
    /// Health server bind address.
    pub health_addr: SocketAddr,
    /// How often the month-end job wakes up.
    pub report_check_interval: Duration,
    /// Optional SMTP delivery of the month-end report.
    pub mail: Option<MailConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `BOT_TOKEN` | Telegram bot token | (required) |
    /// | `FIRST_USER_ID` | Admin's Telegram id | (required) |
    /// | `SECOND_USER_ID` | Partner's Telegram id | (required) |
    /// | `FIRST_USER_NAME` / `SECOND_USER_NAME` | Display names | `User 1` / `User 2` |
    /// | `FIRST_USER_TASKS` / `SECOND_USER_TASKS` | Comma-separated checklists | see source |
    /// | `DATA_DIR` | JSON document directory | `data` |
    /// | `PORT` | Health server port | `8080` |
    /// | `REPORT_CHECK_INTERVAL_SECS` | Month-end job interval | `3600` |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `SMTP_*`, `REPORT_EMAIL_TO` | Report mailer | (disabled) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let first_id = parse_user_id(&var, "FIRST_USER_ID")?;
        let second_id = parse_user_id(&var, "SECOND_USER_ID")?;
        if first_id == second_id {
            return Err(ConfigError::DuplicateUser(first_id));
        }

        let first_name = var("FIRST_USER_NAME").unwrap_or_else(|| "User 1".to_string());
        let second_name = var("SECOND_USER_NAME").unwrap_or_else(|| "User 2".to_string());
        let first_tasks = parse_tasks(
            "FIRST_USER_TASKS",
            &var("FIRST_USER_TASKS").unwrap_or_else(|| DEFAULT_FIRST_TASKS.to_string()),
        )?;
        let second_tasks = parse_tasks(
            "SECOND_USER_TASKS",
            &var("SECOND_USER_TASKS").unwrap_or_else(|| DEFAULT_SECOND_TASKS.to_string()),
        )?;

        let registry = UserRegistry::pair(
            (first_id, first_name, first_tasks),
            (second_id, second_name, second_tasks),
        );

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| "data".to_string()));

        let port: u16 = var("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT"))?;
        let health_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let interval_secs: u64 = var("REPORT_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REPORT_CHECK_INTERVAL_SECS"))?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid("REPORT_CHECK_INTERVAL_SECS"));
        }

        let api_url = var("TELEGRAM_API_URL")
            .unwrap_or_else(|| telegram_client::config::DEFAULT_API_URL.to_string());

        let mail = MailConfig::from_lookup(&var)?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            api_url,
            registry,
            data_dir,
            health_addr,
            report_check_interval: Duration::from_secs(interval_secs),
            mail,
        })
    }

    /// Settings for the Telegram client.
    pub fn bot_config(&self) -> BotConfig {
        BotConfig::new(self.bot_token.expose_secret()).with_api_url(&self.api_url)
    }
}

fn parse_user_id<F>(var: &F, key: &'static str) -> Result<UserId, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).ok_or(ConfigError::Missing(key))?;
    match raw.trim().parse::<UserId>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid(key)),
        Ok(id) => Ok(id),
    }
}

fn parse_tasks(key: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let tasks: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tasks.is_empty() {
        return Err(ConfigError::Invalid(key));
    }
    // Each task becomes a button payload.
    if tasks
        .iter()
        .any(|task| Callback::toggle_data(task).len() > MAX_CALLBACK_DATA_LEN)
    {
        return Err(ConfigError::Invalid(key));
    }
    Ok(tasks)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{0} has an invalid value")]
    Invalid(&'static str),

    #[error("both users have the same id {0}")]
    DuplicateUser(UserId),
}
