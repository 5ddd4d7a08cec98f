//! Parsing of slash commands and button callback data.

/// A slash command sent as message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Track,
    Status,
    Report,
    Reset,
    /// Any other `/word`. Carries the lowercased name without the slash.
    Unknown(String),
}

impl Command {
    /// Parse message text. Returns `None` for plain text.
    ///
    /// Only the first word counts, and a `@botname` suffix is ignored, so
    /// `/Track@my_bot now` is [`Command::Track`].
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(match name.as_str() {
            "start" | "help" => Command::Start,
            "track" => Command::Track,
            "status" => Command::Status,
            "report" => Command::Report,
            "reset" => Command::Reset,
            _ => Command::Unknown(name),
        })
    }
}

const TOGGLE_PREFIX: &str = "toggle_";

/// Largest `callback_data` Telegram accepts, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Callback data carried by an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Flip a task on today's checklist.
    Toggle(String),
    ConfirmReset,
    CancelReset,
    Unknown,
}

impl Callback {
    pub fn parse(data: &str) -> Self {
        match data {
            "confirm_reset" => Callback::ConfirmReset,
            "cancel_reset" => Callback::CancelReset,
            _ => match data.strip_prefix(TOGGLE_PREFIX) {
                Some(task) => Callback::Toggle(task.to_string()),
                None => Callback::Unknown,
            },
        }
    }

    /// Button payload that toggles `task`.
    pub fn toggle_data(task: &str) -> String {
        format!("{}{}", TOGGLE_PREFIX, task)
    }
}
