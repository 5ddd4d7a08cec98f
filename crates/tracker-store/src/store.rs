//! Single-writer access to the two documents.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::document::{load_document, save_document};
use crate::models::{DayEntry, ReportLedger, ReportState, TrackingData, UserId};

/// File name of the tracking document inside the data directory.
pub const TRACKING_FILE: &str = "tracking_data.json";

/// File name of the report ledger inside the data directory.
pub const REPORT_SENT_FILE: &str = "report_sent.json";

#[derive(Debug)]
struct Files {
    tracking: PathBuf,
    ledger: PathBuf,
}

impl Files {
    fn save_tracking(&self, data: &TrackingData) {
        if let Err(e) = save_document(&self.tracking, data) {
            warn!("Error saving tracking data: {}", e);
        }
    }

    fn save_ledger(&self, ledger: &ReportLedger) {
        if let Err(e) = save_document(&self.ledger, ledger) {
            warn!("Error saving report status: {}", e);
        }
    }
}

/// Result of flipping a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleChange {
    /// State of the task after the flip.
    pub now_done: bool,
    /// The user's whole entry for the day after the flip.
    pub entry: DayEntry,
}

/// Owner of the tracking and ledger files.
///
/// Every read-modify-write runs under one lock, so the update loop and the
/// month-end job never interleave. Documents are re-read from disk on each
/// operation. Write failures are logged and not returned.
#[derive(Debug)]
pub struct Store {
    files: Mutex<Files>,
}

impl Store {
    /// Use `data_dir` for both documents. The directory is created on first save.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        info!("Using data directory {}", dir.display());
        Self {
            files: Mutex::new(Files {
                tracking: dir.join(TRACKING_FILE),
                ledger: dir.join(REPORT_SENT_FILE),
            }),
        }
    }

    /// Snapshot of the tracking document.
    pub async fn tracking(&self) -> TrackingData {
        let files = self.files.lock().await;
        load_document(&files.tracking)
    }

    /// Snapshot of the report ledger.
    pub async fn ledger(&self) -> ReportLedger {
        let files = self.files.lock().await;
        load_document(&files.ledger)
    }

    /// Flip a task for a user on a day and persist.
    pub async fn toggle(&self, date: NaiveDate, user: UserId, task: &str) -> ToggleChange {
        let files = self.files.lock().await;
        let mut data: TrackingData = load_document(&files.tracking);
        let now_done = data.toggle(date, user, task);
        files.save_tracking(&data);

        ToggleChange {
            now_done,
            entry: data.day(date, user).cloned().unwrap_or_default(),
        }
    }

    /// Move a month from pending to sent.
    ///
    /// Returns `false` if the month was already sent, so only one caller can
    /// ever win the claim for a given month.
    pub async fn claim_month(&self, month: &str) -> bool {
        let files = self.files.lock().await;
        let mut ledger: ReportLedger = load_document(&files.ledger);
        if ledger.state(month) == ReportState::Sent {
            return false;
        }
        ledger.mark_sent(month);
        files.save_ledger(&ledger);
        true
    }

    /// Clear all tracking history and the report ledger.
    pub async fn reset(&self) {
        let files = self.files.lock().await;
        files.save_tracking(&TrackingData::default());
        files.save_ledger(&ReportLedger::default());
        info!("All tracking data and report status cleared");
    }
}
