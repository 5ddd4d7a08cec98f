//! JSON file persistence for the accountability bot.
//!
//! Two documents live in a data directory:
//!
//! - `tracking_data.json`: day key, then user id, then task name to bool
//! - `report_sent.json`: month key to whether the month-end report went out
//!
//! [`Store`] owns both files and serialises every read-modify-write.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use tracker_store::Store;
//!
//! # async fn example() {
//! let store = Store::open("data");
//! let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
//!
//! let change = store.toggle(today, 111, "Exercise").await;
//! println!("Exercise done: {}", change.now_done);
//!
//! if store.claim_month("2024-05").await {
//!     println!("First claim for May");
//! }
//! # }
//! ```

pub mod document;
pub mod error;
pub mod models;
pub mod store;

pub use document::{load_document, save_document};
pub use error::{Result, StoreError};
pub use models::{
    completed_in, day_key, month_key, DayEntry, ReportLedger, ReportState, TrackingData, UserId,
};
pub use store::{Store, ToggleChange, REPORT_SENT_FILE, TRACKING_FILE};
