//! Reminder draft extraction
//!
//! Pulls the task, frequency and time out of a create-reminder utterance.
//! Persisting and scheduling reminders happens downstream.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::time;
use crate::types::{Frequency, ReminderDateTime, ReminderDraft, ReminderErrorKind};

static DAILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)todos los días|cada día|diariamente").expect("Invalid regex"));

/// Command words and time phrases removed to leave the task
static TASK_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"recuérdame\s*",
        r"recordatorio\s*",
        r"recuerda que\s*",
        r"no olvides\s*",
        r"a las? [0-9]{1,2}(?:(?::|\s*y\s*)[0-9]{1,2})?\s*(?:(?:de|por) la\s*)?(?:mañana|tarde|noche)?",
        r"al medio ?día",
        r"a media ?noche",
        r"pasado mañana\s*",
        r"mañana\s*",
        r"todos los días\s*",
        r"cada día\s*",
        r"diariamente\s*",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("Invalid regex"))
    .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Shorter tasks are treated as missing
const MIN_TASK_CHARS: usize = 3;

/// Build a draft from a create-reminder utterance
pub fn parse_reminder(text: &str) -> ReminderDraft {
    let frequency = if DAILY.is_match(text) {
        Frequency::Daily
    } else {
        Frequency::Once
    };

    let draft = ReminderDraft {
        task: extract_task(text),
        frequency,
        time: time::parse(text),
    };
    tracing::info!(
        task = ?draft.task,
        frequency = ?draft.frequency,
        hour = ?draft.time.hour,
        minute = draft.time.minute,
        "Reminder draft parsed"
    );
    draft
}

fn extract_task(text: &str) -> Option<String> {
    let stripped = TASK_NOISE
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, " ").into_owned());
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let task = collapsed.trim_matches(|c: char| c.is_whitespace() || ",.;".contains(c));

    (task.chars().count() >= MIN_TASK_CHARS).then(|| task.to_string())
}

impl ReminderDraft {
    /// Resolve the draft's time against `now`
    pub fn resolve_at(&self, now: NaiveDateTime) -> ReminderDateTime {
        match (self.time.success, self.time.hour) {
            (true, Some(hour)) => {
                time::resolve_datetime_at(now, hour, self.time.minute, self.time.day_offset)
            }
            _ => ReminderDateTime::failed(
                ReminderErrorKind::MissingTime,
                "¿A qué hora quieres el recordatorio? Por ejemplo: a las 3 de la tarde.".to_string(),
            ),
        }
    }

    /// Resolve against the local wall clock
    pub fn resolve(&self) -> ReminderDateTime {
        self.resolve_at(Local::now().naive_local())
    }

    /// Spoken confirmation of the parsed time, if any
    pub fn confirmation(&self) -> Option<String> {
        match (self.time.success, self.time.hour) {
            (true, Some(hour)) => Some(time::format_confirmation(
                hour,
                self.time.minute,
                self.time.day_offset,
            )),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
