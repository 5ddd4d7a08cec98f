//! Typed documents persisted by the store.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Telegram user id.
pub type UserId = i64;

/// One user's checklist for one day: task name to completion.
pub type DayEntry = BTreeMap<String, bool>;

/// Format a date as a day key (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date as a month key (`YYYY-MM`).
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Count how many of `tasks` are marked done in `entry`.
///
/// Keys in the entry that are not in `tasks` are ignored.
pub fn completed_in(entry: Option<&DayEntry>, tasks: &[String]) -> usize {
    let Some(entry) = entry else {
        return 0;
    };
    tasks
        .iter()
        .filter(|task| entry.get(task.as_str()).copied().unwrap_or(false))
        .count()
}

/// Daily completion records: day key, then user id, then task name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingData {
    days: BTreeMap<String, BTreeMap<String, DayEntry>>,
}

impl TrackingData {
    /// Whether no day has been recorded.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// A user's entry for a day, if one was ever created.
    pub fn day(&self, date: NaiveDate, user: UserId) -> Option<&DayEntry> {
        self.days.get(&day_key(date))?.get(&user.to_string())
    }

    /// Whether a task is marked done.
    pub fn is_done(&self, date: NaiveDate, user: UserId, task: &str) -> bool {
        self.day(date, user)
            .and_then(|entry| entry.get(task).copied())
            .unwrap_or(false)
    }

    /// Number of `tasks` done by a user on a day.
    pub fn completed_count(&self, date: NaiveDate, user: UserId, tasks: &[String]) -> usize {
        completed_in(self.day(date, user), tasks)
    }

    /// Flip a task and return its new state. Entries are created on first use.
    pub fn toggle(&mut self, date: NaiveDate, user: UserId, task: &str) -> bool {
        let entry = self
            .days
            .entry(day_key(date))
            .or_default()
            .entry(user.to_string())
            .or_default();
        let done = entry.entry(task.to_string()).or_insert(false);
        *done = !*done;
        *done
    }

    /// Days in the given month on which the user has an entry, in order.
    ///
    /// Keys that are not valid dates are skipped.
    pub fn tracked_dates(&self, user: UserId, year: i32, month: u32) -> Vec<NaiveDate> {
        let user_key = user.to_string();
        self.days
            .iter()
            .filter(|(_, users)| users.contains_key(&user_key))
            .filter_map(|(key, _)| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok())
            .filter(|date| date.year() == year && date.month() == month)
            .collect()
    }
}

/// Whether the month-end report has gone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ReportState {
    #[default]
    Pending,
    Sent,
}

impl From<bool> for ReportState {
    fn from(sent: bool) -> Self {
        if sent {
            ReportState::Sent
        } else {
            ReportState::Pending
        }
    }
}

impl From<ReportState> for bool {
    fn from(state: ReportState) -> Self {
        state == ReportState::Sent
    }
}

/// Month key to report state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportLedger {
    months: BTreeMap<String, ReportState>,
}

impl ReportLedger {
    /// State for a month key; months never seen are pending.
    pub fn state(&self, month: &str) -> ReportState {
        self.months.get(month).copied().unwrap_or_default()
    }

    /// Record that the report for a month was sent.
    pub fn mark_sent(&mut self, month: &str) {
        self.months.insert(month.to_string(), ReportState::Sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tasks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keys() {
        assert_eq!(day_key(date(2024, 5, 3)), "2024-05-03");
        assert_eq!(month_key(date(2024, 5, 3)), "2024-05");
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut data = TrackingData::default();
        let today = date(2024, 5, 3);

        assert!(data.toggle(today, 1, "Exercise"));
        assert!(data.is_done(today, 1, "Exercise"));
        assert!(!data.toggle(today, 1, "Exercise"));
        assert!(!data.is_done(today, 1, "Exercise"));
    }

    #[test]
    fn test_completed_count_ignores_stale_keys() {
        let mut data = TrackingData::default();
        let today = date(2024, 5, 3);
        data.toggle(today, 1, "Exercise");
        data.toggle(today, 1, "Retired task");

        let current = tasks(&["Exercise", "Studies"]);
        assert_eq!(data.completed_count(today, 1, &current), 1);
        assert_eq!(data.completed_count(today, 2, &current), 0);
    }

    #[test]
    fn test_tracked_dates_filters_month_and_user() {
        let mut data = TrackingData::default();
        data.toggle(date(2024, 4, 30), 1, "A");
        data.toggle(date(2024, 5, 2), 1, "A");
        data.toggle(date(2024, 5, 1), 1, "A");
        data.toggle(date(2024, 5, 1), 2, "B");

        assert_eq!(
            data.tracked_dates(1, 2024, 5),
            vec![date(2024, 5, 1), date(2024, 5, 2)]
        );
        assert_eq!(data.tracked_dates(2, 2024, 5), vec![date(2024, 5, 1)]);
        assert!(data.tracked_dates(3, 2024, 5).is_empty());
    }

    #[test]
    fn test_tracking_json_shape() {
        let mut data = TrackingData::default();
        data.toggle(date(2024, 5, 31), 111, "Exercise");

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["2024-05-31"]["111"]["Exercise"], true);
    }

    #[test]
    fn test_ledger_reads_plain_booleans() {
        let ledger: ReportLedger =
            serde_json::from_str(r#"{"2024-04": true, "2024-05": false}"#).unwrap();
        assert_eq!(ledger.state("2024-04"), ReportState::Sent);
        assert_eq!(ledger.state("2024-05"), ReportState::Pending);
        assert_eq!(ledger.state("2024-06"), ReportState::Pending);
    }

    #[test]
    fn test_ledger_writes_plain_booleans() {
        let mut ledger = ReportLedger::default();
        ledger.mark_sent("2024-05");
        assert_eq!(serde_json::to_string(&ledger).unwrap(), r#"{"2024-05":true}"#);
    }
}
