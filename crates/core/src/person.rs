//! Grammatical person rewriting for message bodies
//!
//! Indirect questions about a contact ("a qué hora viene") are rewritten to
//! address the contact directly ("a qué hora vienes"). Outgoing messages are
//! rendered in the sender's voice.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Whole-phrase rewrites, applied before single verbs
const SECOND_PERSON_PHRASES: &[(&str, &str)] = &[
    ("a qué hora viene", "a qué hora vienes"),
    ("cuándo llega", "cuándo llegas"),
    ("dónde está", "dónde estás"),
    ("cómo está", "cómo estás"),
    ("qué hace", "qué haces"),
    ("si ya llegó", "si ya llegaste"),
    ("si está bien", "si estás bien"),
];

const SECOND_PERSON_VERBS: &[(&str, &str)] = &[
    ("viene", "vienes"),
    ("va", "vas"),
    ("está", "estás"),
    ("llegó", "llegaste"),
    ("salió", "saliste"),
    ("comió", "comiste"),
    ("durmió", "dormiste"),
    ("se siente", "te sientes"),
    ("puede", "puedes"),
    ("tiene", "tienes"),
    ("sabe", "sabes"),
    ("quiere", "quieres"),
];

const FIRST_PERSON: &[(&str, &str)] = &[
    ("te levantaste", "me levanté"),
    ("te acostaste", "me acosté"),
    ("te bañaste", "me bañé"),
    ("tu casa", "mi casa"),
    ("tus cosas", "mis cosas"),
    ("tu familia", "mi familia"),
    ("ya comió", "ya comí"),
    ("ya llegó", "ya llegué"),
    ("está bien", "estoy bien"),
    ("se siente", "me siento"),
    ("llegaste", "llegué"),
    ("comiste", "comí"),
    ("dormiste", "dormí"),
    ("saliste", "salí"),
    ("viniste", "vine"),
    ("fuiste", "fui"),
    ("hiciste", "hice"),
    ("dijiste", "dije"),
];

/// Verb phrases that make the outgoing message a question
const QUESTION_VERBS: &[&str] = &["pregunt", "pregúnt", "será que", "no sé si", "me pregunto si"];

/// Body openers that make the outgoing message a question
const QUESTION_OPENERS: &[&str] = &[
    "si ", "qué ", "a qué ", "cuándo ", "dónde ", "cómo ", "por qué ", "quién ",
];

type Rewrite = (Regex, &'static str);

fn compile(table: &[(&'static str, &'static str)]) -> Vec<Rewrite> {
    table
        .iter()
        .map(|(from, to)| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from))).expect("Invalid regex");
            (re, *to)
        })
        .collect()
}

static SECOND_PERSON_RULES: LazyLock<Vec<Rewrite>> = LazyLock::new(|| {
    let mut rules = compile(SECOND_PERSON_PHRASES);
    rules.extend(compile(SECOND_PERSON_VERBS));
    rules
});

static FIRST_PERSON_RULES: LazyLock<Vec<Rewrite>> = LazyLock::new(|| compile(FIRST_PERSON));

fn rewrite(text: &str, rules: &[Rewrite]) -> String {
    rules.iter().fold(text.trim().to_string(), |acc, (re, to)| {
        re.replace_all(&acc, NoExpand(*to)).into_owned()
    })
}

/// Third person to second person ("ya llegó" → "ya llegaste")
pub fn to_second_person(fragment: &str) -> String {
    rewrite(fragment, &SECOND_PERSON_RULES)
}

/// Second/third person to first person ("llegaste" → "llegué")
pub fn to_first_person(fragment: &str) -> String {
    rewrite(fragment, &FIRST_PERSON_RULES)
}

/// Whether a command with this verb and body should be sent as a question
pub fn is_question(verb: &str, body: &str) -> bool {
    let verb = verb.to_lowercase();
    let body = body.trim().to_lowercase();
    QUESTION_VERBS.iter().any(|q| verb.contains(q))
        || QUESTION_OPENERS.iter().any(|o| body.starts_with(o))
        || body.ends_with('?')
}

/// Render a message body as it will be delivered to the contact
///
/// "dile a" + "que llegué bien" → "Marina dice: Llegué bien";
/// "pregúntale a" + "si ya comió" → "Marina pregunta: ¿Ya comiste?".
pub fn render_outgoing(verb: &str, body: &str, user_name: &str) -> String {
    if is_question(verb, body) {
        let question = strip_prefix_ci(strip_prefix_ci(body.trim(), "que "), "si ");
        let question = to_second_person(question);
        let question = question.trim_start_matches('¿').trim_end_matches('?').trim();
        format!("{} pregunta: ¿{}?", user_name, capitalize_first(question))
    } else {
        let statement = to_first_person(strip_prefix_ci(body.trim(), "que "));
        format!("{} dice: {}", user_name, capitalize_first(&statement))
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> &'a str {
    match text.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => text[prefix.len()..].trim_start(),
        _ => text,
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_person_phrase() {
        assert_eq!(to_second_person("a qué hora viene"), "a qué hora vienes");
        assert_eq!(to_second_person("cuándo llega"), "cuándo llegas");
        assert_eq!(to_second_person("qué hace"), "qué haces");
    }

    #[test]
    fn test_second_person_verbs() {
        assert_eq!(to_second_person("ya llegó"), "ya llegaste");
        assert_eq!(to_second_person("se siente mejor"), "te sientes mejor");
        assert_eq!(to_second_person("está bien"), "estás bien");
    }

    #[test]
    fn test_second_person_whole_words_only() {
        assert_eq!(to_second_person("vamos a la playa"), "vamos a la playa");
        assert_eq!(to_second_person("va a la playa"), "vas a la playa");
    }

    #[test]
    fn test_first_person() {
        assert_eq!(to_first_person("ya llegaste a tu casa"), "ya llegué a mi casa");
        assert_eq!(to_first_person("te bañaste"), "me bañé");
    }

    #[test]
    fn test_is_question() {
        assert!(is_question("pregúntale a", "que hizo hoy"));
        assert!(is_question("dile a", "si viene"));
        assert!(is_question("dile a", "vienes?"));
        assert!(!is_question("dile a", "que llegué bien"));
    }

    #[test]
    fn test_render_statement() {
        assert_eq!(
            render_outgoing("dile a", "que llegué bien", "Marina"),
            "Marina dice: Llegué bien"
        );
    }

    #[test]
    fn test_render_question() {
        assert_eq!(
            render_outgoing("pregúntale a", "si ya comió", "Marina"),
            "Marina pregunta: ¿Ya comiste?"
        );
        assert_eq!(
            render_outgoing("pregúntale a", "a qué hora vienes", "Usuario"),
            "Usuario pregunta: ¿A qué hora vienes?"
        );
    }

    #[test]
    fn test_strip_prefix_ci() {
        assert_eq!(strip_prefix_ci("Que voy", "que "), "voy");
        assert_eq!(strip_prefix_ci("quedo", "que "), "quedo");
        assert_eq!(strip_prefix_ci("qué", "que "), "qué");
    }
}
