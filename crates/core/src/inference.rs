//! Contextual inference of message commands
//!
//! Recognises indirect phrasing such as "quiero saber de Monica a qué hora
//! viene" and rewrites it as the explicit command "pregúntale a Monica a qué
//! hora vienes". A candidate contact must resolve in the contact directory
//! before an inference is accepted.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::contacts::ContactDirectory;
use crate::person::to_second_person;
use crate::types::InferredCommand;

const INFERRED_VERB: &str = "pregúntale a";

/// An indirect-phrasing template
pub struct ContextualPattern {
    pub name: &'static str,
    pub confidence: f32,
    regex: Regex,
}

/// Templates in precedence order
static CONTEXTUAL_PATTERNS: LazyLock<Vec<ContextualPattern>> = LazyLock::new(|| {
    [
        (
            "want_to_know",
            0.9,
            r"(quiero saber|me gustaría saber|quisiera saber|me interesa saber)\s+(?:de\s+|sobre\s+|si\s+)?(.+?)\s+(a qué\s+.+|qué\s+.+|cuándo\s+.+|dónde\s+.+|cómo\s+.+|si\s+.+|cuando\s+.+|donde\s+.+|como\s+.+)",
        ),
        (
            "need_to_know",
            0.8,
            r"(necesito saber|tengo que saber|debo saber)\s+(?:si\s+|que\s+)?(.+?)\s+(ya\s+.+|está\s+.+|viene\s+.+|va\s+.+|llegó\s+.+|puede\s+.+|tiene\s+.+|sabe\s+.+)",
        ),
        (
            "wondering",
            0.85,
            r"(me pregunto si|no sé si|será que)\s+(.+?)\s+(está\s+.+|se siente\s+.+|ya\s+.+|viene\s+.+|puede\s+.+|tiene\s+.+|llegó\s+.+|va\s+.+)",
        ),
        (
            "check_with",
            0.95,
            r"(averigua con|consulta con|pregunta a|ve con)\s+(.+?)\s+(si\s+.+|que\s+.+|cuando\s+.+|cómo\s+.+|a qué\s+.+)",
        ),
    ]
    .into_iter()
    .map(|(name, confidence, pattern)| ContextualPattern {
        name,
        confidence,
        regex: Regex::new(&format!("(?i){}", pattern)).expect("Invalid regex"),
    })
    .collect()
});

/// Engine statistics, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceStats {
    pub patterns_loaded: usize,
    pub directory_available: bool,
}

/// Rewrites indirect phrasing into validated message commands
#[derive(Clone)]
pub struct ContextualInferenceEngine {
    directory: Option<Arc<ContactDirectory>>,
}

impl ContextualInferenceEngine {
    /// Without a directory every candidate contact is accepted as spoken
    pub fn new(directory: Option<Arc<ContactDirectory>>) -> Self {
        if directory.is_none() {
            tracing::warn!("Contextual inference running without a contact directory");
        }
        Self { directory }
    }

    /// Whether any template matches, ignoring contact validation
    pub fn can_infer(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && CONTEXTUAL_PATTERNS.iter().any(|p| p.regex.is_match(text))
    }

    /// First template whose match has a resolvable contact
    pub fn infer(&self, text: &str) -> Option<InferredCommand> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        for pattern in CONTEXTUAL_PATTERNS.iter() {
            let Some(caps) = pattern.regex.captures(text) else {
                continue;
            };
            let candidate = caps[2].trim();
            let question = caps[3].trim();

            let Some(contact) = self.validate_contact(candidate) else {
                tracing::debug!(pattern = pattern.name, candidate = %candidate, "Candidate contact rejected");
                continue;
            };

            let command = InferredCommand {
                verb: INFERRED_VERB.to_string(),
                contact,
                raw_contact: candidate.to_string(),
                body: to_second_person(question),
                confidence: pattern.confidence,
            };
            tracing::info!(
                pattern = pattern.name,
                contact = %command.contact,
                body = %command.body,
                confidence = command.confidence,
                "Message command inferred"
            );
            return Some(command);
        }
        None
    }

    fn validate_contact(&self, candidate: &str) -> Option<String> {
        let Some(directory) = &self.directory else {
            tracing::warn!(candidate = %candidate, "No contact directory, accepting candidate unvalidated");
            return Some(candidate.to_string());
        };
        match directory.resolve(candidate) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(candidate = %candidate, error = %e, "Contact validation failed");
                None
            }
        }
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            patterns_loaded: CONTEXTUAL_PATTERNS.len(),
            directory_available: self.directory.is_some(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{Contact, ContactStore, InMemoryContactStore};
    use crate::error::{Error, Result};

    struct FailingStore;

    impl ContactStore for FailingStore {
        fn list_active_contacts(&self) -> Result<Vec<Contact>> {
            Err(Error::ContactStore("database offline".to_string()))
        }
    }

    fn engine_with(contacts: Vec<Contact>) -> ContextualInferenceEngine {
        let directory = ContactDirectory::with_normalizer(Box::new(InMemoryContactStore::new(contacts)));
        ContextualInferenceEngine::new(Some(Arc::new(directory)))
    }

    fn family() -> ContextualInferenceEngine {
        engine_with(vec![
            Contact::new("Monica", &[]),
            Contact::new("Ana", &[]),
            Contact::new("Luis", &["mi hermano"]),
        ])
    }

    #[test]
    fn test_want_to_know() {
        let cmd = family().infer("quiero saber de Monica a qué hora viene").unwrap();
        assert_eq!(cmd.verb, "pregúntale a");
        assert_eq!(cmd.contact, "Monica");
        assert_eq!(cmd.body, "a qué hora vienes");
        assert_eq!(cmd.confidence, 0.9);
    }

    #[test]
    fn test_unknown_contact_is_rejected() {
        let engine = engine_with(vec![Contact::new("Ana", &[])]);
        assert!(engine.infer("quiero saber de Monica a qué hora viene").is_none());
        assert!(engine.can_infer("quiero saber de Monica a qué hora viene"));
    }

    #[test]
    fn test_wondering() {
        let cmd = family().infer("será que Ana ya llegó").unwrap();
        assert_eq!(cmd.contact, "Ana");
        assert_eq!(cmd.body, "ya llegaste");
        assert_eq!(cmd.confidence, 0.85);
    }

    #[test]
    fn test_wondering_feelings() {
        let cmd = family().infer("me pregunto si mi hermano se siente mejor").unwrap();
        assert_eq!(cmd.contact, "Luis");
        assert_eq!(cmd.raw_contact, "mi hermano");
        assert_eq!(cmd.body, "te sientes mejor");
    }

    #[test]
    fn test_need_to_know() {
        let cmd = family().infer("necesito saber si Luis ya comió").unwrap();
        assert_eq!(cmd.contact, "Luis");
        assert_eq!(cmd.body, "ya comiste");
        assert_eq!(cmd.confidence, 0.8);
    }

    #[test]
    fn test_check_with() {
        let cmd = family().infer("averigua con Ana si viene a cenar").unwrap();
        assert_eq!(cmd.contact, "Ana");
        assert_eq!(cmd.body, "si vienes a cenar");
        assert_eq!(cmd.confidence, 0.95);
    }

    #[test]
    fn test_contact_case_preserved_without_directory() {
        let engine = ContextualInferenceEngine::new(None);
        let cmd = engine.infer("Quiero saber de Roberto cómo está").unwrap();
        assert_eq!(cmd.contact, "Roberto");
        assert_eq!(cmd.body, "cómo estás");
    }

    #[test]
    fn test_degraded_mode_accepts_any_candidate() {
        let engine = ContextualInferenceEngine::new(None);
        assert!(!engine.stats().directory_available);
        let cmd = engine.infer("será que Nadie ya llegó").unwrap();
        assert_eq!(cmd.contact, "Nadie");
        assert_eq!(cmd.raw_contact, "Nadie");
    }

    #[test]
    fn test_store_error_rejects_candidate() {
        let directory = ContactDirectory::with_normalizer(Box::new(FailingStore));
        let engine = ContextualInferenceEngine::new(Some(Arc::new(directory)));
        assert!(engine.infer("será que Ana ya llegó").is_none());
    }

    #[test]
    fn test_no_pattern() {
        assert!(family().infer("qué hora es").is_none());
        assert!(family().infer("").is_none());
        assert!(!family().can_infer("   "));
    }

    #[test]
    fn test_stats() {
        let stats = family().stats();
        assert_eq!(stats.patterns_loaded, 4);
        assert!(stats.directory_available);
    }
}
