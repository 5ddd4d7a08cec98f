//! Command and callback handlers.
//!
//! [`Tracker`] turns an authorised user's command or button press into a
//! store operation and the reply to show. It never talks to Telegram itself;
//! the dispatcher delivers what it returns.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Datelike;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tracker_store::{Store, UserId};

use crate::clock::Clock;
use crate::command::{Callback, Command};
use crate::render::{self, Reply};
use crate::report::MonthlyReport;
use crate::users::UserRegistry;

/// A message to push to someone other than the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
}

/// What to do in response to a button press.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackOutcome {
    /// Toast shown when the callback is acknowledged.
    pub answer: Option<String>,
    /// Replacement for the message carrying the button.
    pub edit: Option<Reply>,
    pub notification: Option<Notification>,
}

impl CallbackOutcome {
    fn answer(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn edit(reply: Reply) -> Self {
        Self {
            edit: Some(reply),
            ..Default::default()
        }
    }
}

/// Handles commands and callbacks for the two registered users.
pub struct Tracker {
    store: Arc<Store>,
    registry: Arc<UserRegistry>,
    clock: Arc<dyn Clock>,
    /// Admins who were shown the reset prompt and have not answered yet.
    pending_resets: Mutex<HashSet<UserId>>,
}

impl Tracker {
    pub fn new(store: Arc<Store>, registry: Arc<UserRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            registry,
            clock,
            pending_resets: Mutex::new(HashSet::new()),
        }
    }

    /// Reply to a slash command.
    pub async fn handle_command(&self, user_id: UserId, command: &Command) -> Reply {
        let Some(user) = self.registry.get(user_id) else {
            warn!(user_id = %user_id, ?command, "Rejected command from unknown user");
            return Reply::plain(render::UNAUTHORIZED);
        };
        debug!(user_id = %user_id, ?command, "Handling command");

        let today = self.clock.today();
        match command {
            Command::Start => render::welcome(user),
            Command::Track => {
                let data = self.store.tracking().await;
                render::checklist(user, today, data.day(today, user_id))
            }
            Command::Status => {
                let data = self.store.tracking().await;
                render::status(&self.registry, &data, today)
            }
            Command::Report => {
                let data = self.store.tracking().await;
                let report =
                    MonthlyReport::compute(&data, &self.registry, today.year(), today.month());
                render::monthly_report(&report)
            }
            Command::Reset => {
                if !user.is_admin {
                    return Reply::plain(render::ADMIN_ONLY);
                }
                self.pending_resets.lock().await.insert(user_id);
                render::reset_warning()
            }
            Command::Unknown(name) => render::unknown_command(name),
        }
    }

    /// React to a button press.
    pub async fn handle_callback(&self, user_id: UserId, callback: &Callback) -> CallbackOutcome {
        let Some(user) = self.registry.get(user_id) else {
            warn!(user_id = %user_id, ?callback, "Rejected callback from unknown user");
            return CallbackOutcome::answer(render::UNAUTHORIZED_CALLBACK);
        };
        debug!(user_id = %user_id, ?callback, "Handling callback");

        match callback {
            Callback::Toggle(task) => {
                if !user.has_task(task) {
                    return CallbackOutcome::edit(Reply::plain(render::INVALID_TASK));
                }

                let today = self.clock.today();
                let change = self.store.toggle(today, user_id, task).await;
                let entry = Some(&change.entry);

                // `now_done` means the task was open before, so reaching
                // all-done here is a fresh transition.
                let notification = (change.now_done && user.all_done(entry)).then(|| {
                    info!(user_id = %user_id, partner_id = %user.partner_id, "All tasks completed");
                    Notification {
                        chat_id: user.partner_id,
                        text: render::partner_notification(user),
                    }
                });

                CallbackOutcome {
                    answer: None,
                    edit: Some(render::checklist(user, today, entry)),
                    notification,
                }
            }
            Callback::ConfirmReset => {
                if !user.is_admin {
                    return CallbackOutcome::answer(render::UNAUTHORIZED_CALLBACK);
                }
                if !self.pending_resets.lock().await.remove(&user_id) {
                    return CallbackOutcome::edit(Reply::plain(render::RESET_EXPIRED));
                }
                self.store.reset().await;
                info!(user_id = %user_id, "Data reset by admin");
                CallbackOutcome::edit(Reply::plain(render::RESET_DONE))
            }
            Callback::CancelReset => {
                if !user.is_admin {
                    return CallbackOutcome::answer(render::UNAUTHORIZED_CALLBACK);
                }
                self.pending_resets.lock().await.remove(&user_id);
                CallbackOutcome::edit(Reply::plain(render::RESET_CANCELLED))
            }
            Callback::Unknown => CallbackOutcome::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const ADMIN: UserId = 111;
    const PARTNER: UserId = 222;
    const STRANGER: UserId = 999;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn setup() -> (TempDir, Arc<FixedClock>, Tracker) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()));
        let registry = Arc::new(UserRegistry::pair(
            (ADMIN, "Ann".into(), vec!["Run".into(), "Read".into()]),
            (PARTNER, "Ben".into(), vec!["Maths".into()]),
        ));
        let clock = Arc::new(FixedClock::new(date(10)));
        let tracker = Tracker::new(store, registry, clock.clone());
        (dir, clock, tracker)
    }

    fn toggle(task: &str) -> Callback {
        Callback::Toggle(task.to_string())
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let (_dir, _clock, tracker) = setup();

        let first = tracker.handle_callback(ADMIN, &toggle("Run")).await;
        assert!(first.edit.unwrap().text.contains("Progress: 1/2"));

        let second = tracker.handle_callback(ADMIN, &toggle("Run")).await;
        let edit = second.edit.unwrap();
        assert!(edit.text.contains("Progress: 0/2"));
        assert_eq!(
            edit.keyboard.unwrap().buttons().next().unwrap().text,
            "⬜ Run"
        );
    }

    #[tokio::test]
    async fn test_exactly_one_notification_per_completion() {
        let (_dir, _clock, tracker) = setup();

        let a = tracker.handle_callback(ADMIN, &toggle("Run")).await;
        assert!(a.notification.is_none());

        let b = tracker.handle_callback(ADMIN, &toggle("Read")).await;
        let note = b.notification.unwrap();
        assert_eq!(note.chat_id, PARTNER);
        assert_eq!(
            note.text,
            "🎉 Ann has completed all tasks for today! Great job! 💪"
        );

        // Un-toggling never notifies; re-completing is a new transition.
        let c = tracker.handle_callback(ADMIN, &toggle("Read")).await;
        assert!(c.notification.is_none());
        let d = tracker.handle_callback(ADMIN, &toggle("Read")).await;
        assert!(d.notification.is_some());
    }

    #[tokio::test]
    async fn test_days_are_independent() {
        let (_dir, clock, tracker) = setup();
        tracker.handle_callback(PARTNER, &toggle("Maths")).await;

        clock.set(date(11));
        let reply = tracker.handle_command(PARTNER, &Command::Track).await;
        assert!(reply.text.contains("Progress: 0/1"));
    }

    #[tokio::test]
    async fn test_invalid_task() {
        let (_dir, _clock, tracker) = setup();
        // Ben's task is not on Ann's list.
        let outcome = tracker.handle_callback(ADMIN, &toggle("Maths")).await;
        assert_eq!(outcome.edit.unwrap().text, "❌ Invalid task");
        assert!(outcome.notification.is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_everywhere() {
        let (_dir, _clock, tracker) = setup();

        for command in [
            Command::Start,
            Command::Track,
            Command::Status,
            Command::Report,
            Command::Reset,
            Command::Unknown("x".into()),
        ] {
            let reply = tracker.handle_command(STRANGER, &command).await;
            assert_eq!(reply.text, render::UNAUTHORIZED);
        }

        for callback in [
            toggle("Run"),
            Callback::ConfirmReset,
            Callback::CancelReset,
            Callback::Unknown,
        ] {
            let outcome = tracker.handle_callback(STRANGER, &callback).await;
            assert_eq!(outcome.answer.as_deref(), Some(render::UNAUTHORIZED_CALLBACK));
            assert!(outcome.edit.is_none());
        }
    }

    #[tokio::test]
    async fn test_reset_clears_status() {
        let (_dir, _clock, tracker) = setup();
        tracker.handle_callback(ADMIN, &toggle("Run")).await;
        tracker.handle_callback(PARTNER, &toggle("Maths")).await;

        let warning = tracker.handle_command(ADMIN, &Command::Reset).await;
        assert!(warning.keyboard.is_some());

        let outcome = tracker.handle_callback(ADMIN, &Callback::ConfirmReset).await;
        assert_eq!(outcome.edit.unwrap().text, render::RESET_DONE);

        let status = tracker.handle_command(PARTNER, &Command::Status).await;
        assert!(status.text.contains("Progress: 0/2 (0%)"));
        assert!(status.text.contains("Progress: 0/1 (0%)"));
    }

    #[tokio::test]
    async fn test_reset_requires_admin_and_proposal() {
        let (_dir, _clock, tracker) = setup();
        tracker.handle_callback(ADMIN, &toggle("Run")).await;

        let reply = tracker.handle_command(PARTNER, &Command::Reset).await;
        assert_eq!(reply.text, render::ADMIN_ONLY);

        let outcome = tracker.handle_callback(PARTNER, &Callback::ConfirmReset).await;
        assert_eq!(outcome.answer.as_deref(), Some(render::UNAUTHORIZED_CALLBACK));

        // No prompt outstanding.
        let outcome = tracker.handle_callback(ADMIN, &Callback::ConfirmReset).await;
        assert_eq!(outcome.edit.unwrap().text, render::RESET_EXPIRED);

        tracker.handle_command(ADMIN, &Command::Reset).await;
        let outcome = tracker.handle_callback(ADMIN, &Callback::CancelReset).await;
        assert_eq!(outcome.edit.unwrap().text, render::RESET_CANCELLED);

        // Cancel consumed the proposal.
        let outcome = tracker.handle_callback(ADMIN, &Callback::ConfirmReset).await;
        assert_eq!(outcome.edit.unwrap().text, render::RESET_EXPIRED);

        let track = tracker.handle_command(ADMIN, &Command::Track).await;
        assert!(track.text.contains("Progress: 1/2"));
    }

    #[tokio::test]
    async fn test_report_command() {
        let (_dir, _clock, tracker) = setup();
        tracker.handle_callback(PARTNER, &toggle("Maths")).await;
        let reply = tracker.handle_command(ADMIN, &Command::Report).await;
        assert!(reply.text.contains("Monthly Report - 2024-05"));
        assert!(reply.text.contains("More consistent: Ben"));
    }
}
