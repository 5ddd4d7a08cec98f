//! Month-end report job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracker_store::{month_key, Store};

use crate::clock::{is_last_day_of_month, Clock};
use crate::mailer::ReportMailer;
use crate::render;
use crate::report::MonthlyReport;
use crate::sender::ChatSender;
use crate::users::UserRegistry;

/// Delay before the first check after startup.
pub const FIRST_CHECK_DELAY: Duration = Duration::from_secs(10);

/// What a single check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    NotLastDay,
    AlreadySent,
    /// The month was claimed and the report sent to this many chats.
    Sent { month: String, delivered: usize },
}

/// Sends the monthly report once, on the last day of each month.
pub struct MonthlyReporter {
    store: Arc<Store>,
    registry: Arc<UserRegistry>,
    clock: Arc<dyn Clock>,
    sender: Arc<dyn ChatSender>,
    mailer: Option<Arc<ReportMailer>>,
}

impl MonthlyReporter {
    pub fn new(
        store: Arc<Store>,
        registry: Arc<UserRegistry>,
        clock: Arc<dyn Clock>,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            sender,
            mailer: None,
        }
    }

    /// Also email each month-end report.
    pub fn with_mailer(mut self, mailer: Arc<ReportMailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Run one check.
    ///
    /// The month is marked sent before delivery starts, so a crash or a
    /// failed send never produces a second report for the same month.
    pub async fn tick(&self) -> TickOutcome {
        let today = self.clock.today();
        if !is_last_day_of_month(today) {
            debug!("Not the last day of the month, skipping report check");
            return TickOutcome::NotLastDay;
        }

        let month = month_key(today);
        if !self.store.claim_month(&month).await {
            debug!(month = %month, "Monthly report already sent");
            return TickOutcome::AlreadySent;
        }

        info!(month = %month, "Sending end of month report");
        let data = self.store.tracking().await;
        let report = MonthlyReport::compute(&data, &self.registry, today.year(), today.month());
        let reply = render::month_end_report(&report);

        let mut delivered = 0;
        for user in self.registry.iter() {
            match self.sender.send_message(user.id, &reply).await {
                Ok(()) => delivered += 1,
                Err(e) => error!(user_id = %user.id, "Error sending report: {}", e),
            }
        }

        if let Some(mailer) = &self.mailer {
            let subject = format!("Monthly Report - {}", report.month);
            if let Err(e) = mailer
                .send_report(&subject, &render::report_plain_text(&report))
                .await
            {
                warn!(month = %month, "Error emailing report: {}", e);
            }
        }

        TickOutcome::Sent { month, delivered }
    }

    /// Check after `first_delay` and then every `period`, until the task is aborted.
    pub fn spawn(self: Arc<Self>, first_delay: Duration, period: Duration) -> JoinHandle<()> {
        info!(
            "Monthly report checker scheduled (first in {:?}, every {:?})",
            first_delay, period
        );
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + first_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::sender::RecordingSender;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use tracker_store::ReportState;

    const ANN: i64 = 111;
    const BEN: i64 = 222;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    struct Fixture {
        _dir: TempDir,
        store: Arc<Store>,
        clock: Arc<FixedClock>,
        sender: Arc<RecordingSender>,
        reporter: MonthlyReporter,
    }

    fn fixture(sender: RecordingSender) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()));
        let registry = Arc::new(UserRegistry::pair(
            (ANN, "Ann".into(), vec!["Run".into()]),
            (BEN, "Ben".into(), vec!["Maths".into()]),
        ));
        let clock = Arc::new(FixedClock::new(date(5, 30)));
        let sender = Arc::new(sender);
        let reporter =
            MonthlyReporter::new(store.clone(), registry, clock.clone(), sender.clone());
        Fixture {
            _dir: dir,
            store,
            clock,
            sender,
            reporter,
        }
    }

    #[tokio::test]
    async fn test_noop_before_last_day() {
        let f = fixture(RecordingSender::new());
        assert_eq!(f.reporter.tick().await, TickOutcome::NotLastDay);
        assert!(f.sender.items().is_empty());
        assert_eq!(f.store.ledger().await.state("2024-05"), ReportState::Pending);
    }

    #[tokio::test]
    async fn test_sends_once_per_month() {
        let f = fixture(RecordingSender::new());
        f.store.toggle(date(5, 31), BEN, "Maths").await;
        f.clock.set(date(5, 31));

        assert_eq!(
            f.reporter.tick().await,
            TickOutcome::Sent {
                month: "2024-05".into(),
                delivered: 2
            }
        );
        for _ in 0..5 {
            assert_eq!(f.reporter.tick().await, TickOutcome::AlreadySent);
        }

        let messages = f.sender.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, ANN);
        assert_eq!(messages[1].0, BEN);
        assert!(messages[0].1.starts_with("🎯 *End of Month Report*"));
        assert!(messages[0].1.contains("More consistent: Ben"));
        assert_eq!(f.store.ledger().await.state("2024-05"), ReportState::Sent);

        // Next month is a fresh key.
        f.clock.set(date(6, 30));
        assert!(matches!(f.reporter.tick().await, TickOutcome::Sent { .. }));
        assert_eq!(f.sender.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_claims_month() {
        let f = fixture(RecordingSender::failing_for([ANN]));
        f.clock.set(date(5, 31));

        assert_eq!(
            f.reporter.tick().await,
            TickOutcome::Sent {
                month: "2024-05".into(),
                delivered: 1
            }
        );
        assert_eq!(f.reporter.tick().await, TickOutcome::AlreadySent);
    }

    #[tokio::test]
    async fn test_concurrent_ticks_send_once() {
        let f = fixture(RecordingSender::new());
        f.clock.set(date(5, 31));
        let reporter = Arc::new(f.reporter);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reporter = reporter.clone();
                tokio::spawn(async move { reporter.tick().await })
            })
            .collect();

        let mut sent = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), TickOutcome::Sent { .. }) {
                sent += 1;
            }
        }
        assert_eq!(sent, 1);
        assert_eq!(f.sender.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_job_runs_on_schedule() {
        let f = fixture(RecordingSender::new());
        f.clock.set(date(5, 31));
        let handle = Arc::new(f.reporter).spawn(FIRST_CHECK_DELAY, Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(f.sender.messages().is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(f.sender.messages().len(), 2);

        tokio::time::sleep(Duration::from_secs(3 * 3600)).await;
        assert_eq!(f.sender.messages().len(), 2);

        handle.abort();
    }
}
