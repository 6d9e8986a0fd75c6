//! Intent and contextual command routing for the Kata voice assistant
//!
//! This crate turns one transcribed Spanish utterance into a routing decision:
//! - Intent classification (ordered keyword-phrase table)
//! - Explicit message commands ("dile a Marina que llegué bien")
//! - Contextual inference of indirect requests, validated against contacts
//! - Time expression parsing for reminders
//! - Policy-driven choice between the classic path and a generative fallback

pub mod types;

pub mod config;
pub mod contacts;
pub mod error;
pub mod inference;
pub mod intent;
pub mod message;
pub mod person;
pub mod reminder;
pub mod router;
pub mod session;
pub mod time;

// Re-export commonly used types at crate root
pub use types::{
    CommandSource, Decision, Frequency, InferredCommand, Intent, IntentCategory, MessageCommand,
    ReminderDateTime, ReminderDraft, ReminderErrorKind, RouteReason, Routed, TimeParseResult,
};

pub use config::RouterConfig;
pub use contacts::{
    Contact, ContactDirectory, ContactNormalizer, ContactResolver, ContactStore,
    InMemoryContactStore, SqliteContactStore,
};
pub use error::{Error, Result};
pub use inference::ContextualInferenceEngine;
pub use intent::IntentClassifier;
pub use message::{is_message_command, parse_send_message};
pub use reminder::parse_reminder;
pub use router::{CommandRouter, GenerativeFallback, RoutePolicy};
pub use session::Session;
