//! Domain models shared by the classifier, parsers and router
//!
//! This module contains the core types used throughout the router, including:
//! - Intent labels and their routing categories
//! - Message commands (explicit and inferred)
//! - Time parse results and resolved reminder datetimes
//! - Routing decisions

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Intents
// ============================================================================

/// Intent labels recognised by the classic classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    GetDate,
    GetTime,
    PlugOn,
    PlugOff,
    EmergencyAlert,
    ContactPerson,
    CreateReminder,
    CreateDailyReminder,
    ListReminders,
    DeleteReminder,
    ReadMessages,
    SendMessage,
    ShutdownDevice,
}

impl Intent {
    /// Canonical label, as used in config files and logs
    pub fn as_label(&self) -> &'static str {
        match self {
            Intent::GetDate => "GET_DATE",
            Intent::GetTime => "GET_TIME",
            Intent::PlugOn => "PLUG_ON",
            Intent::PlugOff => "PLUG_OFF",
            Intent::EmergencyAlert => "EMERGENCY_ALERT",
            Intent::ContactPerson => "CONTACT_PERSON",
            Intent::CreateReminder => "CREATE_REMINDER",
            Intent::CreateDailyReminder => "CREATE_DAILY_REMINDER",
            Intent::ListReminders => "LIST_REMINDERS",
            Intent::DeleteReminder => "DELETE_REMINDER",
            Intent::ReadMessages => "READ_MESSAGES",
            Intent::SendMessage => "SEND_MESSAGE",
            Intent::ShutdownDevice => "SHUTDOWN_DEVICE",
        }
    }

    /// Routing category used by the always-classic policy
    pub fn category(&self) -> IntentCategory {
        match self {
            Intent::GetTime => IntentCategory::Hora,
            Intent::GetDate => IntentCategory::Fecha,
            Intent::PlugOn | Intent::PlugOff => IntentCategory::Enchufe,
            Intent::CreateReminder
            | Intent::CreateDailyReminder
            | Intent::ListReminders
            | Intent::DeleteReminder => IntentCategory::Recordatorio,
            Intent::ContactPerson => IntentCategory::ContactoEmergencia,
            Intent::EmergencyAlert => IntentCategory::Emergencia,
            Intent::ReadMessages | Intent::SendMessage => IntentCategory::Mensajes,
            Intent::ShutdownDevice => IntentCategory::Sistema,
        }
    }

    /// Intents whose arguments come from the message parsers
    pub fn is_messaging(&self) -> bool {
        matches!(self, Intent::SendMessage | Intent::ContactPerson)
    }

    /// Intents that create a reminder and carry a time expression
    pub fn is_reminder_creation(&self) -> bool {
        matches!(self, Intent::CreateReminder | Intent::CreateDailyReminder)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Coarse command families, named the way user preferences name them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Hora,
    Fecha,
    Enchufe,
    Recordatorio,
    /// No intent maps here yet; kept so preference files naming it still load
    Medicacion,
    ContactoEmergencia,
    Emergencia,
    Mensajes,
    Sistema,
}

// ============================================================================
// Message Commands
// ============================================================================

/// An explicit "tell X that Y" command, as spoken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCommand {
    /// Lower-cased sending verb phrase (e.g. "dile a")
    pub verb: String,
    /// Contact reference exactly as captured, not validated
    pub contact: String,
    /// Message body including its continuation marker ("que ...", "si ...")
    pub body: String,
}

/// A command rewritten from indirect phrasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredCommand {
    pub verb: String,
    /// Display name returned by the contact directory (or the raw
    /// candidate when no directory is configured)
    pub contact: String,
    /// Contact reference as spoken
    pub raw_contact: String,
    /// Fragment rewritten to second person
    pub body: String,
    pub confidence: f32,
}

/// Where a send-message decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    Explicit,
    Inferred,
}

// ============================================================================
// Time Expressions
// ============================================================================

/// Outcome of parsing a natural-language time phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeParseResult {
    /// 0-23 when recognised
    pub hour: Option<u32>,
    pub minute: u32,
    /// 0 = today, 1 = tomorrow, 2 = day after tomorrow
    pub day_offset: u32,
    pub success: bool,
}

impl Default for TimeParseResult {
    fn default() -> Self {
        Self {
            hour: None,
            minute: 0,
            day_offset: 0,
            success: false,
        }
    }
}

/// Why a reminder time could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderErrorKind {
    TimePassed,
    TimeOutOfRange,
    MissingTime,
}

/// A parsed time combined with the current clock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDateTime {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReminderErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<NaiveDateTime>,
    /// Spanish sentence for direct playback when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
}

impl ReminderDateTime {
    pub fn resolved(datetime: NaiveDateTime) -> Self {
        Self {
            success: true,
            error: None,
            datetime: Some(datetime),
            user_message: None,
        }
    }

    pub fn failed(error: ReminderErrorKind, user_message: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            datetime: None,
            user_message: Some(user_message),
        }
    }
}

// ============================================================================
// Reminders
// ============================================================================

/// How often a reminder repeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
}

/// Reminder arguments extracted from a create-reminder utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDraft {
    /// What to remind about, with command words and time phrases removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub frequency: Frequency,
    pub time: TimeParseResult,
}

// ============================================================================
// Routing Decisions
// ============================================================================

/// Final routing decision handed to the command dispatcher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Execute a classic intent
    Intent {
        intent: Intent,
        confidence: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        reminder: Option<ReminderDraft>,
    },
    /// Send (or ask) a message to a contact
    SendMessage {
        verb: String,
        contact: String,
        raw_contact: String,
        body: String,
        /// Body rendered for delivery, in the sender's voice
        outgoing: String,
        confidence: f32,
        source: CommandSource,
    },
    /// Answer produced by the generative fallback
    Generative { response: String },
    /// Nothing actionable; `reason` is suitable for playback
    Reject { reason: String },
}

/// Why the router chose a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    EmptyInput,
    AlwaysClassic,
    NeverGenerative,
    CriticalKeyword,
    GenerativeDisabled,
    ClassicConfidenceHigh,
    ClassicConfidenceLow,
    GenerativeUnavailable,
    GenerativeFailed,
    MessageCommand,
    ContactUnresolved,
    ContextualInference,
    MessagingIntentWithoutCommand,
    NoMatch,
}

/// A decision plus the classic analysis that led to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routed {
    pub decision: Decision,
    pub reason: RouteReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classic_intent: Option<Intent>,
    pub classic_confidence: f32,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_label_matches_serde() {
        let json = serde_json::to_string(&Intent::CreateDailyReminder).unwrap();
        assert_eq!(json, "\"CREATE_DAILY_REMINDER\"");
        assert_eq!(Intent::CreateDailyReminder.as_label(), "CREATE_DAILY_REMINDER");
    }

    #[test]
    fn test_intent_categories() {
        assert_eq!(Intent::PlugOff.category(), IntentCategory::Enchufe);
        assert_eq!(Intent::DeleteReminder.category(), IntentCategory::Recordatorio);
        assert_eq!(Intent::ContactPerson.category(), IntentCategory::ContactoEmergencia);
    }

    #[test]
    fn test_messaging_intents() {
        assert!(Intent::SendMessage.is_messaging());
        assert!(Intent::ContactPerson.is_messaging());
        assert!(!Intent::ReadMessages.is_messaging());
    }

    #[test]
    fn test_category_deserializes_from_preference_name() {
        let cat: IntentCategory = serde_json::from_str("\"contacto_emergencia\"").unwrap();
        assert_eq!(cat, IntentCategory::ContactoEmergencia);
    }

    #[test]
    fn test_decision_serialization_is_tagged() {
        let decision = Decision::Reject {
            reason: "Comando no reconocido".to_string(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["type"], "reject");
        assert_eq!(json["reason"], "Comando no reconocido");
    }

    #[test]
    fn test_failed_reminder_skips_datetime() {
        let result = ReminderDateTime::failed(ReminderErrorKind::TimePassed, "ya pasó".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "time_passed");
        assert!(json.get("datetime").is_none());
    }
}
