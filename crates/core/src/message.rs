//! Explicit message command parsing
//!
//! Splits "dile a Marina que llegué bien" into verb, contact and body. The
//! contact is returned as spoken; resolving it is the caller's job.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::MessageCommand;

/// Templates as (verb alternation, body alternation). Order is precedence.
const SEND_TEMPLATES: &[(&str, &str)] = &[
    (
        "dile a|avisale a|avísale a|enviale un mensaje a|envía un mensaje a|envia un mensaje a",
        r"que\s+.+",
    ),
    ("digale a|dígale a|avisa a", r"que\s+.+"),
    (
        "preguntale a|pregúntale a|pregunta a",
        r"si\s+.+|que\s+.+|cómo\s+.+|cuándo\s+.+|dónde\s+.+|por qué\s+.+|a qué\s+.+|cuando\s+.+|donde\s+.+",
    ),
    (
        "mandale un mensaje a|mándale un mensaje a|manda un mensaje a",
        r"que\s+.+",
    ),
    (
        "enviale a|envíale a|manda mensaje a|envia mensaje a|envía mensaje a",
        r"que\s+.+",
    ),
    (
        "haz el favor de preguntarle? a|podrías preguntarle? a|te pido que le preguntes a",
        r"si\s+.+|que\s+.+|cómo\s+.+|cuándo\s+.+|a qué\s+.+|cuando\s+.+",
    ),
    (
        "por favor pregúntale? a|disculpa podrías preguntarle? a|me haces el favor de preguntarle? a",
        r"a qué\s+.+|qué\s+.+|si\s+.+|cuándo\s+.+|cómo\s+.+|cuando\s+.+",
    ),
];

static SEND_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SEND_TEMPLATES
        .iter()
        .map(|(verbs, body)| {
            Regex::new(&format!(r"(?i)({})\s+(.+?)\s+({})", verbs, body)).expect("Invalid regex")
        })
        .collect()
});

/// Extract verb, contact and body from an explicit send command
///
/// The contact is the shortest span between the verb and the first body
/// marker, so "dile a Ana que ya voy que espere" yields contact "Ana".
pub fn parse_send_message(text: &str) -> Option<MessageCommand> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for re in SEND_PATTERNS.iter() {
        if let Some(caps) = re.captures(text) {
            let command = MessageCommand {
                verb: caps[1].trim().to_lowercase(),
                contact: caps[2].trim().to_string(),
                body: caps[3].trim().to_string(),
            };
            tracing::info!(
                verb = %command.verb,
                contact = %command.contact,
                body = %command.body,
                "Message command parsed"
            );
            return Some(command);
        }
    }
    None
}

/// Whether `text` is an explicit send command
pub fn is_message_command(text: &str) -> bool {
    parse_send_message(text).is_some()
}

// ============================================================================
// Tests
// ============================================================================
