//! Accountability bot entry point.
//!
//! Run with: cargo run -p accountability-bot
//!
//! Configuration via .env file or environment variables:
//!   BOT_TOKEN                        - Telegram bot token (required)
//!   FIRST_USER_ID / SECOND_USER_ID   - Telegram ids of the pair (required)
//!   FIRST_USER_NAME / SECOND_USER_NAME, FIRST_USER_TASKS / SECOND_USER_TASKS
//!   DATA_DIR                         - JSON document directory (default: data)
//!   PORT                             - Health check port (default: 8080)
//!   SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD, REPORT_EMAIL_TO - optional report email

use std::sync::Arc;

use accountability_bot::{
    health, scheduler::FIRST_CHECK_DELAY, Config, Dispatcher, MonthlyReporter, ReportMailer,
    SystemClock, TelegramSender, Tracker,
};
use telegram_client::{subscribe, BotClient};
use tracing::{error, info, warn};
use tracker_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
                .add_directive("accountability_bot=debug".parse()?),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // Health server for the hosting platform
    let health_addr = config.health_addr;
    tokio::spawn(async move {
        if let Err(e) = health::bind_and_serve(health_addr).await {
            error!("Health server stopped: {}", e);
        }
    });

    let client = BotClient::connect(config.bot_config()).await?;
    client.delete_webhook(true).await?;

    let store = Arc::new(Store::open(&config.data_dir));
    let registry = Arc::new(config.registry.clone());
    let clock = Arc::new(SystemClock);
    let sender = Arc::new(TelegramSender::new(client.clone()));

    let mut reporter = MonthlyReporter::new(
        store.clone(),
        registry.clone(),
        clock.clone(),
        sender.clone(),
    );
    if let Some(mail) = config.mail.clone() {
        match ReportMailer::new(mail) {
            Ok(mailer) => reporter = reporter.with_mailer(Arc::new(mailer)),
            Err(e) => warn!("Report email disabled: {}", e),
        }
    }
    let report_job = Arc::new(reporter).spawn(FIRST_CHECK_DELAY, config.report_check_interval);

    let tracker = Arc::new(Tracker::new(store, registry, clock));
    let dispatcher = Dispatcher::new(tracker, sender);

    info!("Bot is running (Ctrl+C to stop)");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let result = dispatcher.run_with_shutdown(subscribe(&client), shutdown).await;

    report_job.abort();
    info!("Bot stopped");
    result.map_err(Into::into)
}
