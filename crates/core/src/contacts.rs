//! Contact lookup
//!
//! Stores list active contacts; resolvers map a spoken reference such as
//! "la Maria" or "mi hermana" onto a stored display name.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A person messages can be sent to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub display_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Contact {
    pub fn new(display_name: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            display_name: display_name.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Source of active contacts
pub trait ContactStore: Send + Sync {
    fn list_active_contacts(&self) -> Result<Vec<Contact>>;
}

/// Maps a spoken contact reference to a display name
pub trait ContactResolver: Send + Sync {
    fn find_best_match(&self, candidate: &str, available: &[Contact]) -> Option<String>;
}

// ============================================================================
// Normalizer
// ============================================================================

/// Spanish articles and possessives that may prefix a contact reference
const ARTICLES_AND_POSSESSIVES: &[&str] = &[
    "la", "el", "las", "los", "mi", "mis", "tu", "tus", "su", "sus", "nuestro", "nuestra",
    "vuestro", "vuestra",
];

/// Articles tried when the reference has none
const COMMON_ARTICLES: &[&str] = &["la", "el", "mi"];

fn is_article(word: &str) -> bool {
    ARTICLES_AND_POSSESSIVES.contains(&word)
}

/// Article-aware resolver for Spanish contact references
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactNormalizer;

impl ContactNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Search variants for `raw`, original spelling first
    ///
    /// "la Maria" → ["la Maria", "Maria"]; "Maria" → ["Maria", "La Maria",
    /// "El Maria", "Mi Maria"].
    pub fn variants(&self, raw: &str) -> Vec<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }

        let lower = raw.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut variants = vec![raw.to_string()];
        let mut push = |v: String| {
            if !variants.contains(&v) {
                variants.push(v);
            }
        };

        match words.split_first() {
            Some((first, rest)) if is_article(first) => {
                if !rest.is_empty() {
                    push(capitalize_name(&rest.join(" ")));
                }
            }
            Some(_) => {
                for article in COMMON_ARTICLES {
                    push(capitalize_name(&format!("{} {}", article, lower)));
                }
            }
            None => {}
        }

        tracing::debug!(raw = %raw, ?variants, "Contact variants");
        variants
    }
}

impl ContactResolver for ContactNormalizer {
    fn find_best_match(&self, candidate: &str, available: &[Contact]) -> Option<String> {
        if available.is_empty() {
            return None;
        }
        let variants: Vec<String> = self
            .variants(candidate)
            .into_iter()
            .map(|v| v.to_lowercase())
            .collect();

        for variant in &variants {
            for contact in available {
                if let Some(alias) = contact.aliases.iter().find(|a| a.to_lowercase() == *variant) {
                    tracing::info!(variant = %variant, contact = %contact.display_name, alias = %alias, "Exact alias match");
                    return Some(contact.display_name.clone());
                }
            }
            for contact in available {
                if contact.display_name.to_lowercase() == *variant {
                    tracing::info!(variant = %variant, contact = %contact.display_name, "Exact name match");
                    return Some(contact.display_name.clone());
                }
            }
        }

        for variant in &variants {
            for contact in available {
                if overlaps(variant, &contact.display_name.to_lowercase()) {
                    tracing::info!(variant = %variant, contact = %contact.display_name, "Partial name match");
                    return Some(contact.display_name.clone());
                }
                if let Some(alias) = contact
                    .aliases
                    .iter()
                    .find(|a| overlaps(variant, &a.to_lowercase()))
                {
                    tracing::info!(variant = %variant, contact = %contact.display_name, alias = %alias, "Partial alias match");
                    return Some(contact.display_name.clone());
                }
            }
        }

        tracing::warn!(candidate = %candidate, contacts = available.len(), "No contact match");
        None
    }
}

/// Either string contains the other; empty strings never overlap
fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Capitalize each word; articles stay lower-case unless leading
fn capitalize_name(name: &str) -> String {
    name.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && is_article(&lower) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Fixed contact list, e.g. from config
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactStore {
    contacts: Vec<Contact>,
}

impl InMemoryContactStore {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }
}

impl ContactStore for InMemoryContactStore {
    fn list_active_contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.clone())
    }
}

/// Contacts read from the assistant's SQLite database
///
/// Expects a `contacts` table with `display_name`, `aliases` (JSON array of
/// strings, nullable) and `is_active` columns.
pub struct SqliteContactStore {
    conn: Mutex<Connection>,
}

impl SqliteContactStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Opening contact database");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ContactStore for SqliteContactStore {
    fn list_active_contacts(&self) -> Result<Vec<Contact>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::ContactStore("connection lock poisoned".to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT display_name, aliases FROM contacts WHERE is_active = 1 ORDER BY display_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut contacts = Vec::new();
        for row in rows {
            let (display_name, aliases) = row?;
            let aliases = match aliases.as_deref().map(str::trim) {
                None | Some("") => Vec::new(),
                Some(raw) => serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
                    tracing::warn!(contact = %display_name, error = %e, "Ignoring malformed aliases");
                    Vec::new()
                }),
            };
            contacts.push(Contact {
                display_name,
                aliases,
            });
        }

        tracing::debug!(count = contacts.len(), "Loaded active contacts");
        Ok(contacts)
    }
}

// ============================================================================
// Directory
// ============================================================================

/// A store paired with a resolver
pub struct ContactDirectory {
    store: Box<dyn ContactStore>,
    resolver: Box<dyn ContactResolver>,
}

impl ContactDirectory {
    pub fn new(store: Box<dyn ContactStore>, resolver: Box<dyn ContactResolver>) -> Self {
        Self { store, resolver }
    }

    /// Directory using the article-aware normalizer
    pub fn with_normalizer(store: Box<dyn ContactStore>) -> Self {
        Self::new(store, Box::new(ContactNormalizer::new()))
    }

    /// Display name for `candidate`, or `None` when nobody matches
    pub fn resolve(&self, candidate: &str) -> Result<Option<String>> {
        let contacts = self.store.list_active_contacts()?;
        Ok(self.resolver.find_best_match(candidate, &contacts))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Vec<Contact> {
        vec![
            Contact::new("Monica", &["mi hija", "moni"]),
            Contact::new("Maria", &[]),
            Contact::new("Dr. Pérez", &["el doctor"]),
        ]
    }

    #[test]
    fn test_variants_strip_article() {
        let v = ContactNormalizer::new().variants("la Maria");
        assert_eq!(v, vec!["la Maria".to_string(), "Maria".to_string()]);
    }

    #[test]
    fn test_variants_add_articles() {
        let v = ContactNormalizer::new().variants("maria");
        assert_eq!(v, vec!["maria", "La Maria", "El Maria", "Mi Maria"]);
    }

    #[test]
    fn test_variants_single_article() {
        assert_eq!(ContactNormalizer::new().variants("la"), vec!["la"]);
        assert!(ContactNormalizer::new().variants("  ").is_empty());
    }

    #[test]
    fn test_capitalize_keeps_inner_articles_lower() {
        assert_eq!(capitalize_name("hija de la vecina"), "Hija De la Vecina");
    }

    #[test]
    fn test_exact_alias_match() {
        let n = ContactNormalizer::new();
        assert_eq!(n.find_best_match("mi hija", &family()), Some("Monica".to_string()));
        assert_eq!(n.find_best_match("el doctor", &family()), Some("Dr. Pérez".to_string()));
    }

    #[test]
    fn test_article_stripped_name_match() {
        let n = ContactNormalizer::new();
        assert_eq!(n.find_best_match("la Maria", &family()), Some("Maria".to_string()));
    }

    #[test]
    fn test_case_insensitive_name_match() {
        let n = ContactNormalizer::new();
        assert_eq!(n.find_best_match("MONICA", &family()), Some("Monica".to_string()));
    }

    #[test]
    fn test_partial_match() {
        let contacts = vec![Contact::new("Ana Lucía", &[])];
        let n = ContactNormalizer::new();
        assert_eq!(n.find_best_match("ana", &contacts), Some("Ana Lucía".to_string()));
    }

    #[test]
    fn test_no_match() {
        let n = ContactNormalizer::new();
        assert_eq!(n.find_best_match("Roberto", &family()), None);
        assert_eq!(n.find_best_match("Monica", &[]), None);
    }

    #[test]
    fn test_sqlite_store_lists_active_contacts() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE contacts (
                id INTEGER PRIMARY KEY,
                display_name TEXT NOT NULL,
                aliases TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );
            INSERT INTO contacts (display_name, aliases, is_active) VALUES
                ('Monica', '[\"mi hija\"]', 1),
                ('Antiguo', NULL, 0),
                ('Carlos', NULL, 1),
                ('Rosa', 'not json', 1);",
        )
        .unwrap();

        let store = SqliteContactStore::from_connection(conn);
        let contacts = store.list_active_contacts().unwrap();

        let names: Vec<&str> = contacts.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Carlos", "Monica", "Rosa"]);
        assert_eq!(contacts[1].aliases, vec!["mi hija".to_string()]);
        assert!(contacts[2].aliases.is_empty());
    }

    #[test]
    fn test_sqlite_store_missing_table_is_error() {
        let store = SqliteContactStore::from_connection(Connection::open_in_memory().unwrap());
        assert!(matches!(store.list_active_contacts(), Err(Error::Database(_))));
    }

    #[test]
    fn test_directory_resolve() {
        let dir = ContactDirectory::with_normalizer(Box::new(InMemoryContactStore::new(family())));
        assert_eq!(dir.resolve("moni").unwrap(), Some("Monica".to_string()));
        assert_eq!(dir.resolve("Roberto").unwrap(), None);
    }
}
