//! Long polling client for receiving updates.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, BoxStream, Stream};
use tracing::{debug, error, info, warn};

use crate::client::BotClient;
use crate::error::BotApiError;
use crate::types::Update;

/// Update kinds the stream asks for.
pub const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Configuration for retrying failed polls.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failures (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

struct PollState {
    client: BotClient,
    reconnect: ReconnectConfig,
    offset: Option<i64>,
    buffer: VecDeque<Update>,
    failures: u32,
}

impl PollState {
    async fn next(mut self) -> Option<(Result<Update, BotApiError>, Self)> {
        loop {
            if let Some(update) = self.buffer.pop_front() {
                return Some((Ok(update), self));
            }

            if self.failures > 0 {
                let delay = self.reconnect.delay_for_attempt(self.failures - 1);
                debug!("Retrying getUpdates in {:?}", delay);
                tokio::time::sleep(delay).await;
            }

            match self.client.get_updates(self.offset, ALLOWED_UPDATES).await {
                Ok(updates) => {
                    if self.failures > 0 {
                        info!("Polling restored after {} failures", self.failures);
                    }
                    self.failures = 0;
                    if let Some(last) = updates.last() {
                        // Acknowledges everything up to and including `last`
                        self.offset = Some(last.update_id + 1);
                    }
                    debug!("Received {} updates", updates.len());
                    self.buffer.extend(updates);
                }
                Err(e) => {
                    self.failures += 1;
                    if !self.reconnect.should_retry(self.failures) {
                        error!("Giving up polling after {} failures: {}", self.failures, e);
                        return None;
                    }
                    warn!("getUpdates failed (failures: {}): {}", self.failures, e);
                    return Some((Err(e), self));
                }
            }
        }
    }
}

/// A stream of incoming updates.
pub struct UpdateStream {
    inner: BoxStream<'static, Result<Update, BotApiError>>,
}

impl UpdateStream {
    /// Create a new update stream from a BotClient.
    pub fn new(client: &BotClient) -> Self {
        info!("Starting long polling (timeout {:?})", client.config().poll_timeout);

        let state = PollState {
            client: client.clone(),
            reconnect: ReconnectConfig::default(),
            offset: None,
            buffer: VecDeque::new(),
            failures: 0,
        };

        Self {
            inner: Box::pin(stream::unfold(state, PollState::next)),
        }
    }
}

impl Stream for UpdateStream {
    type Item = Result<Update, BotApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Create an update stream from a BotClient.
pub fn subscribe(client: &BotClient) -> UpdateStream {
    UpdateStream::new(client)
}
