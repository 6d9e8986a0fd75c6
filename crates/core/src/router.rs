//! Command routing
//!
//! Decides, for one utterance, between a classic intent, a message command
//! (explicit or inferred), the generative fallback, or a rejection.

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::contacts::ContactDirectory;
use crate::error::Result;
use crate::inference::ContextualInferenceEngine;
use crate::intent::IntentClassifier;
use crate::message::parse_send_message;
use crate::person::render_outgoing;
use crate::reminder::parse_reminder;
use crate::session::Session;
use crate::types::{CommandSource, Decision, Intent, IntentCategory, RouteReason, Routed};

/// Confidence reported for a phrase-table hit
pub const CLASSIC_MATCH_CONFIDENCE: f32 = 0.95;

/// Confidence reported when no phrase matched
pub const CLASSIC_MISS_CONFIDENCE: f32 = 0.1;

const EXPLICIT_COMMAND_CONFIDENCE: f32 = 1.0;

pub const UNRECOGNIZED_COMMAND: &str = "Comando no reconocido";

pub const GENERATIVE_APOLOGY: &str =
    "Lo siento, no pude procesar tu solicitud. ¿Podrías repetirla?";

const EMPTY_INPUT: &str = "No escuché ningún comando";

// ============================================================================
// Generative Fallback
// ============================================================================

/// Free-form answering backend for utterances the classic path cannot handle
pub trait GenerativeFallback: Send + Sync {
    fn is_available(&self) -> bool;

    /// `classic` is the intent the phrase table found, if any
    fn respond(&self, text: &str, classic: Option<Intent>) -> Result<String>;
}

// ============================================================================
// Policy
// ============================================================================

/// Routing preferences, taken from [generative] and [routing]
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePolicy {
    pub generative_enabled: bool,
    pub min_classic_confidence: f32,
    pub always_classic: Vec<IntentCategory>,
    pub never_generative: Vec<Intent>,
    /// Stored lower-cased
    pub critical_keywords: Vec<String>,
    pub min_inference_confidence: f32,
}

impl RoutePolicy {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            generative_enabled: config.generative.enabled,
            min_classic_confidence: config.generative.min_classic_confidence,
            always_classic: config.routing.always_classic.clone(),
            never_generative: config.routing.never_generative.clone(),
            critical_keywords: config
                .routing
                .critical_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            min_inference_confidence: config.routing.min_inference_confidence,
        }
    }

    fn has_critical_keyword(&self, lower: &str) -> bool {
        self.critical_keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(k.as_str()))
    }

    /// Messaging intents are always handled locally
    fn forces_classic(&self, intent: Intent) -> bool {
        matches!(intent, Intent::SendMessage | Intent::ReadMessages)
            || self.always_classic.contains(&intent.category())
    }
}

// ============================================================================
// Router
// ============================================================================

pub struct CommandRouter {
    classifier: IntentClassifier,
    inference: ContextualInferenceEngine,
    directory: Option<Arc<ContactDirectory>>,
    generative: Option<Box<dyn GenerativeFallback>>,
    policy: RoutePolicy,
}

impl CommandRouter {
    pub fn new(config: &RouterConfig) -> Self {
        Self::with_directory(config, None)
    }

    /// Router whose contact validation is fixed at construction
    pub fn with_directory(config: &RouterConfig, directory: Option<ContactDirectory>) -> Self {
        let directory = directory.map(Arc::new);
        Self {
            classifier: IntentClassifier::new(),
            inference: ContextualInferenceEngine::new(directory.clone()),
            directory,
            generative: None,
            policy: RoutePolicy::from_config(config),
        }
    }

    /// Validate explicit and inferred contacts against `directory`
    pub fn with_contacts(mut self, directory: ContactDirectory) -> Self {
        let directory = Arc::new(directory);
        self.inference = ContextualInferenceEngine::new(Some(Arc::clone(&directory)));
        self.directory = Some(directory);
        self
    }

    pub fn with_generative(mut self, fallback: Box<dyn GenerativeFallback>) -> Self {
        self.generative = Some(fallback);
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn inference(&self) -> &ContextualInferenceEngine {
        &self.inference
    }

    fn generative_ready(&self) -> bool {
        self.policy.generative_enabled
            && self.generative.as_ref().is_some_and(|g| g.is_available())
    }

    /// Route one utterance
    pub fn route(&self, session: &Session, text: &str) -> Routed {
        let text = text.trim();
        if text.is_empty() {
            return Routed {
                decision: Decision::Reject {
                    reason: EMPTY_INPUT.to_string(),
                },
                reason: RouteReason::EmptyInput,
                classic_intent: None,
                classic_confidence: 0.0,
            };
        }

        let lower = text.to_lowercase();
        let classic = self.classifier.classify(text);
        let confidence = if classic.is_some() {
            CLASSIC_MATCH_CONFIDENCE
        } else {
            CLASSIC_MISS_CONFIDENCE
        };

        // An explicit command wins over any intent phrase inside its body
        let (decision, reason) = match self.route_explicit(session, text) {
            Some(outcome) => outcome,
            None => match classic {
                Some(intent) if !intent.is_messaging() => {
                    self.route_classic(text, &lower, intent, confidence)
                }
                _ => match self.route_inferred(session, text) {
                    Some(outcome) => outcome,
                    None => match classic {
                        Some(intent) => (
                            classic_decision(text, intent, confidence),
                            RouteReason::MessagingIntentWithoutCommand,
                        ),
                        None => self.route_unresolved(text, &lower),
                    },
                },
            },
        };

        tracing::info!(
            classic = ?classic,
            reason = ?reason,
            decision = decision_kind(&decision),
            "Routed utterance"
        );

        Routed {
            decision,
            reason,
            classic_intent: classic,
            classic_confidence: confidence,
        }
    }

    /// Which path a matched non-messaging intent takes
    fn classic_policy(&self, intent: Intent, confidence: f32, lower: &str) -> (RouteReason, bool) {
        if self.policy.forces_classic(intent) {
            (RouteReason::AlwaysClassic, false)
        } else if self.policy.never_generative.contains(&intent)
            || self.policy.has_critical_keyword(lower)
        {
            (RouteReason::NeverGenerative, false)
        } else if !self.policy.generative_enabled {
            (RouteReason::GenerativeDisabled, false)
        } else if confidence >= self.policy.min_classic_confidence {
            (RouteReason::ClassicConfidenceHigh, false)
        } else if self.generative_ready() {
            (RouteReason::ClassicConfidenceLow, true)
        } else {
            (RouteReason::GenerativeUnavailable, false)
        }
    }

    fn route_classic(
        &self,
        text: &str,
        lower: &str,
        intent: Intent,
        confidence: f32,
    ) -> (Decision, RouteReason) {
        let (reason, use_generative) = self.classic_policy(intent, confidence, lower);

        if use_generative {
            if let Some(generative) = &self.generative {
                match generative.respond(text, Some(intent)) {
                    Ok(response) => return (Decision::Generative { response }, reason),
                    Err(e) => {
                        tracing::error!(error = %e, intent = %intent, "Generative fallback failed, using classic intent");
                        return (
                            classic_decision(text, intent, confidence),
                            RouteReason::GenerativeFailed,
                        );
                    }
                }
            }
        }

        (classic_decision(text, intent, confidence), reason)
    }

    /// "dile a X que ..." and friends
    fn route_explicit(&self, session: &Session, text: &str) -> Option<(Decision, RouteReason)> {
        let command = parse_send_message(text)?;
        let Some(contact) = self.resolve_contact(&command.contact) else {
            return Some((
                Decision::Reject {
                    reason: format!("No encontré a {} en tus contactos", command.contact),
                },
                RouteReason::ContactUnresolved,
            ));
        };
        let outgoing = render_outgoing(&command.verb, &command.body, &session.user_name);
        Some((
            Decision::SendMessage {
                verb: command.verb,
                contact,
                raw_contact: command.contact,
                body: command.body,
                outgoing,
                confidence: EXPLICIT_COMMAND_CONFIDENCE,
                source: CommandSource::Explicit,
            },
            RouteReason::MessageCommand,
        ))
    }

    /// Indirect phrasing, gated by `min_inference_confidence`
    fn route_inferred(&self, session: &Session, text: &str) -> Option<(Decision, RouteReason)> {
        let inferred = self.inference.infer(text)?;
        if inferred.confidence < self.policy.min_inference_confidence {
            tracing::debug!(
                confidence = inferred.confidence,
                threshold = self.policy.min_inference_confidence,
                "Inferred command below threshold"
            );
            return None;
        }

        let outgoing = render_outgoing(&inferred.verb, &inferred.body, &session.user_name);
        Some((
            Decision::SendMessage {
                verb: inferred.verb,
                contact: inferred.contact,
                raw_contact: inferred.raw_contact,
                body: inferred.body,
                outgoing,
                confidence: inferred.confidence,
                source: CommandSource::Inferred,
            },
            RouteReason::ContextualInference,
        ))
    }

    /// Resolved display name; the raw reference when no directory is set
    fn resolve_contact(&self, raw: &str) -> Option<String> {
        let Some(directory) = &self.directory else {
            tracing::warn!(contact = %raw, "No contact directory, accepting contact unvalidated");
            return Some(raw.to_string());
        };
        match directory.resolve(raw) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(contact = %raw, error = %e, "Contact lookup failed");
                None
            }
        }
    }

    /// No intent and no message command
    fn route_unresolved(&self, text: &str, lower: &str) -> (Decision, RouteReason) {
        let reject = |reason: &str| Decision::Reject {
            reason: reason.to_string(),
        };

        if self.policy.has_critical_keyword(lower) {
            return (reject(UNRECOGNIZED_COMMAND), RouteReason::CriticalKeyword);
        }
        if !self.policy.generative_enabled {
            return (reject(UNRECOGNIZED_COMMAND), RouteReason::GenerativeDisabled);
        }
        let Some(generative) = self.generative.as_ref().filter(|g| g.is_available()) else {
            return (reject(UNRECOGNIZED_COMMAND), RouteReason::GenerativeUnavailable);
        };

        match generative.respond(text, None) {
            Ok(response) => (Decision::Generative { response }, RouteReason::NoMatch),
            Err(e) => {
                tracing::error!(error = %e, "Generative fallback failed");
                (reject(GENERATIVE_APOLOGY), RouteReason::GenerativeFailed)
            }
        }
    }
}

/// Classic decision, with a reminder draft for reminder-creating intents
fn classic_decision(text: &str, intent: Intent, confidence: f32) -> Decision {
    Decision::Intent {
        intent,
        confidence,
        reminder: intent.is_reminder_creation().then(|| parse_reminder(text)),
    }
}

fn decision_kind(decision: &Decision) -> &'static str {
    match decision {
        Decision::Intent { .. } => "intent",
        Decision::SendMessage { .. } => "send_message",
        Decision::Generative { .. } => "generative",
        Decision::Reject { .. } => "reject",
    }
}

// ============================================================================
// Tests
// ============================================================================
