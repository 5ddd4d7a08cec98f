//! Chat message text and keyboards.
//!
//! Everything here is pure: handlers decide *what* to say and these
//! functions decide how it looks. Markdown replies use Telegram's legacy
//! Markdown, so user-supplied names and task labels are escaped.

use std::fmt::Write;

use chrono::NaiveDate;
use telegram_client::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracker_store::{day_key, DayEntry, TrackingData};

use crate::command::Callback;
use crate::report::{MonthlyReport, Verdict};
use crate::users::{User, UserRegistry};

pub const UNAUTHORIZED: &str = "❌ You are not authorized to use this bot.";
pub const UNAUTHORIZED_CALLBACK: &str = "❌ Unauthorized";
pub const INVALID_TASK: &str = "❌ Invalid task";
pub const ADMIN_ONLY: &str = "❌ Only admins can reset data.";
pub const RESET_DONE: &str = "✅ All data has been reset successfully.";
pub const RESET_CANCELLED: &str = "❌ Reset cancelled.";
pub const RESET_EXPIRED: &str = "⚠️ No reset is pending. Send /reset to start again.";

const MONTH_END_HEADER: &str = "🎯 *End of Month Report*\n\n";

/// An outgoing message body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
            keyboard: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Markdown),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

fn is_markdown_special(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[')
}

/// Escape legacy Markdown control characters outside any entity.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_markdown_special(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Bold `text` in legacy Markdown.
///
/// Escapes are not allowed inside an entity, so the bold run is closed
/// before each control character and reopened after it.
pub fn markdown_bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut run = String::new();
    for c in text.chars() {
        if is_markdown_special(c) {
            if !run.is_empty() {
                out.push('*');
                out.push_str(&run);
                out.push('*');
                run.clear();
            }
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        out.push('*');
        out.push_str(&run);
        out.push('*');
    }
    out
}

pub fn welcome(user: &User) -> Reply {
    Reply::plain(format!(
        "👋 Welcome {}!\n\n\
         This bot helps you and your partner track daily tasks.\n\n\
         📋 Available Commands:\n\
         /track - Mark today's tasks as complete\n\
         /status - View your completion status\n\
         /report - View monthly report\n\
         /reset - Reset all data (admin only)\n\n\
         Let's stay accountable together! 💪",
        user.name
    ))
}

pub fn unknown_command(command: &str) -> Reply {
    Reply::plain(format!(
        "🤔 Unknown command /{}. Send /start to see what I can do.",
        command
    ))
}

/// Today's checklist with one toggle button per task.
pub fn checklist(user: &User, date: NaiveDate, entry: Option<&DayEntry>) -> Reply {
    let done = |task: &str| entry.and_then(|e| e.get(task).copied()).unwrap_or(false);

    let keyboard = InlineKeyboardMarkup::single_column(user.tasks.iter().map(|task| {
        let mark = if done(task) { "✅" } else { "⬜" };
        InlineKeyboardButton::callback(format!("{} {}", mark, task), Callback::toggle_data(task))
    }));

    let text = format!(
        "📅 {}\n_{}_\n\n\
         Progress: {}/{} tasks completed\n\n\
         Click on a task to toggle completion:",
        markdown_bold(&format!("{}'s Tasks for Today", user.name)),
        day_key(date),
        user.completed(entry),
        user.tasks.len()
    );

    Reply::markdown(text).with_keyboard(keyboard)
}

/// Today's grid for both users, in registry order.
pub fn status(registry: &UserRegistry, data: &TrackingData, date: NaiveDate) -> Reply {
    let mut text = format!("📊 *Status Report for {}*\n\n", day_key(date));

    for user in registry.iter() {
        let entry = data.day(date, user.id);
        let completed = user.completed(entry);
        let total = user.tasks.len();
        let percent = if total > 0 {
            completed as f64 * 100.0 / total as f64
        } else {
            0.0
        };

        let _ = writeln!(text, "{}", markdown_bold(&user.name));
        let _ = writeln!(text, "Progress: {}/{} ({:.0}%)", completed, total, percent);
        for task in &user.tasks {
            let mark = if data.is_done(date, user.id, task) {
                "✅"
            } else {
                "❌"
            };
            let _ = writeln!(text, "  {} {}", mark, escape_markdown(task));
        }
        text.push('\n');
    }

    Reply::markdown(text)
}

/// The `/report` reply.
pub fn monthly_report(report: &MonthlyReport) -> Reply {
    Reply::markdown(report_body(report, true))
}

/// The scheduled month-end broadcast.
pub fn month_end_report(report: &MonthlyReport) -> Reply {
    Reply::markdown(format!("{}{}", MONTH_END_HEADER, report_body(report, true)))
}

/// Report without Markdown markup, for email.
pub fn report_plain_text(report: &MonthlyReport) -> String {
    report_body(report, false)
}

fn report_body(report: &MonthlyReport, markdown: bool) -> String {
    let bold = |s: &str| {
        if markdown {
            markdown_bold(s)
        } else {
            s.to_string()
        }
    };
    let label = |s: &str| {
        if markdown {
            escape_markdown(s)
        } else {
            s.to_string()
        }
    };

    let mut text = format!("📊 {}\n\n", bold(&format!("Monthly Report - {}", report.month)));

    for stats in &report.users {
        if !stats.has_data() {
            let _ = writeln!(text, "{}: No data for this month\n", bold(&stats.name));
            continue;
        }

        let _ = writeln!(text, "{}", bold(&stats.name));
        let _ = writeln!(text, "Days tracked: {}", stats.days_tracked);
        let _ = writeln!(text, "Perfect days: {}", stats.perfect_days);
        let _ = writeln!(text, "Overall completion: {:.1}%", stats.completion.percent());
        let _ = writeln!(text, "Consistency: {:.1}%\n", stats.consistency.percent());
        for task in &stats.tasks {
            let _ = writeln!(text, "  • {}: {:.1}%", label(&task.task), task.rate.percent());
        }
        text.push('\n');
    }

    match &report.verdict {
        Verdict::Winner { name, .. } => {
            let _ = write!(text, "🏆 {}", bold(&format!("More consistent: {}", name)));
        }
        Verdict::Tie => {
            let _ = write!(text, "🤝 {}", bold("It's a tie!"));
        }
    }

    text
}

/// Admin confirmation prompt for wiping all data.
pub fn reset_warning() -> Reply {
    Reply::markdown(
        "⚠️ *Warning*\n\n\
         This will delete ALL tracking data for both users. This action cannot be undone.\n\n\
         Are you sure?",
    )
    .with_keyboard(InlineKeyboardMarkup::single_row([
        InlineKeyboardButton::callback("✅ Yes, Reset All", "confirm_reset"),
        InlineKeyboardButton::callback("❌ Cancel", "cancel_reset"),
    ]))
}

pub fn partner_notification(user: &User) -> String {
    format!(
        "🎉 {} has completed all tasks for today! Great job! 💪",
        user.name
    )
}
