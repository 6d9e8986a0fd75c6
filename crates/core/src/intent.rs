//! Classic intent classification
//!
//! Keyword-phrase matching against an ordered table of rules. The first rule
//! (in table order) with a phrase contained in the utterance wins, so the
//! order of the table is part of its contract.

use crate::types::Intent;

/// Default phrase table. Order matters: see module docs.
const DEFAULT_PHRASES: &[(Intent, &[&str])] = &[
    (
        Intent::GetDate,
        &["qué día", "cual dia", "cuál es la fecha", "que fecha"],
    ),
    (
        Intent::GetTime,
        &[
            "qué hora es",
            "que hora es",
            "dime la hora",
            "dame la hora",
            "dígame la hora",
            "cuál es la hora",
            "cual es la hora",
            "qué horas son",
            "que hora son",
            "que horas son",
            "la hora",
            "me puede dar la hora",
            "me puedes dar la hora",
            "podrías darme la hora",
        ],
    ),
    (Intent::PlugOn, &["enciende el enchufe", "prende el enchufe"]),
    (Intent::PlugOff, &["apaga el enchufe"]),
    (Intent::EmergencyAlert, &["ayuda", "emergencia", "pide ayuda"]),
    (
        Intent::ContactPerson,
        &["llama a", "contacta a", "avísale a", "avisa a"],
    ),
    (
        Intent::CreateReminder,
        &["recuérdame", "recordatorio", "recuerda que", "no olvides"],
    ),
    (
        Intent::CreateDailyReminder,
        &[
            "recuérdame todos los días",
            "recordatorio diario",
            "todos los días recuérdame",
        ],
    ),
    (
        Intent::ListReminders,
        &[
            "qué recordatorios",
            "cuáles son mis recordatorios",
            "mis recordatorios",
            "lista recordatorios",
        ],
    ),
    (
        Intent::DeleteReminder,
        &[
            "elimina",
            "borra",
            "cancela recordatorio",
            "quita recordatorio",
            "elimina recordatorio",
            "borra recordatorio",
            "elimina el recordatorio",
        ],
    ),
    (
        Intent::ReadMessages,
        &[
            "lee el mensaje",
            "lee los mensajes",
            "leer mensaje",
            "leer mensajes",
            "lee mensaje",
            "lee mensajes",
            "mostrar mensaje",
            "mostrar mensajes",
            "muestra mensaje",
            "muestra mensajes",
            "revisar mensajes",
            "revisar mensaje",
            "qué mensajes",
            "que mensajes",
            "cuáles mensajes",
            "cuales mensajes",
            "qué mensaje",
            "que mensaje",
            "tienes mensajes",
            "tengo mensajes",
            "dime los mensajes",
            "dime que mensajes",
            "dime qué mensajes",
            "enséñame los mensajes",
            "enseñame los mensajes",
            "ver mensajes",
            "ver mensaje",
        ],
    ),
    (
        Intent::SendMessage,
        &[
            // direct
            "dile a",
            "avisale a",
            "avísale a",
            "enviale un mensaje a",
            "envía un mensaje a",
            "envia un mensaje a",
            "digale a",
            "dígale a",
            "avisa a",
            "preguntale a",
            "pregúntale a",
            "pregunta a",
            "mandale un mensaje a",
            "mándale un mensaje a",
            "manda un mensaje a",
            "enviale a",
            "envíale a",
            "manda mensaje a",
            "envia mensaje a",
            "envía mensaje a",
            // courteous
            "quiero saber",
            "me gustaría saber",
            "quisiera saber",
            "me interesa saber",
            "haz el favor de preguntar",
            "haz el favor de preguntarle",
            "podrías preguntar",
            "podrías preguntarle",
            "te pido que preguntes",
            "te pido que le preguntes",
            "disculpa podrías preguntar",
            "por favor pregunta",
            "por favor pregúntale",
            "será que puedes preguntar",
            "no sé si puedes preguntar",
            "a ver si puedes preguntar",
            "me haces el favor de preguntar",
            // indirect
            "quiero que sepas",
            "me gustaría que supieras",
            "necesito que sepas",
            "será que",
            "no sé si",
            "me pregunto si",
            "quisiera que le dijeras",
            "me gustaría que le dijeras",
            "haz el favor de decirle",
            "podrías decirle",
        ],
    ),
    (
        Intent::ShutdownDevice,
        &[
            "apágate",
            "apagate",
            "apaga te",
            "apaga el dispositivo",
            "apagar sistema",
            "apagar el sistema",
        ],
    ),
];

/// One entry of the phrase table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseRule {
    pub intent: Intent,
    /// Stored lower-cased
    pub phrases: Vec<String>,
}

/// Ordered keyword-phrase classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<PhraseRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Classifier over the built-in Spanish phrase table
    pub fn new() -> Self {
        let rules = DEFAULT_PHRASES
            .iter()
            .map(|(intent, phrases)| (*intent, phrases.iter().map(|p| p.to_string()).collect()))
            .collect();
        Self::with_rules(rules)
    }

    /// Classifier over a custom table; order of `rules` is precedence order
    pub fn with_rules(rules: Vec<(Intent, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(intent, phrases)| PhraseRule {
                intent,
                phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[PhraseRule] {
        &self.rules
    }

    /// Return the first intent whose phrase is a substring of `text`
    pub fn classify(&self, text: &str) -> Option<Intent> {
        if text.trim().is_empty() {
            return None;
        }
        let lower = text.to_lowercase();

        for rule in &self.rules {
            if let Some(phrase) = rule.phrases.iter().find(|p| lower.contains(p.as_str())) {
                tracing::info!(intent = %rule.intent, phrase = %phrase, "Intent detected");
                return Some(rule.intent);
            }
        }

        tracing::debug!(text = %text, "No intent matched");
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
