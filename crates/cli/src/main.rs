//! Kata Command Router CLI
//!
//! A thin wrapper around kata-router-core that routes one utterance and
//! prints the decision as JSON.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{ArgAction, Parser};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kata_router_core::config::APP_DIR;
use kata_router_core::{
    time, CommandRouter, Contact, ContactDirectory, Decision, InMemoryContactStore, RouterConfig,
    Session, SqliteContactStore,
};

/// Rejected utterances are appended here, under the user data directory
const FAILED_LOG_FILE: &str = "failed_commands.txt";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "kata-router")]
#[command(about = "Route Spanish voice commands to intents, messages or the generative fallback")]
struct Args {
    /// Transcribed utterance (or a time phrase with --time)
    text: String,

    /// Path to kata_router.toml (default: ./kata_router.toml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database with a contacts table
    #[arg(long = "contacts")]
    contacts_db: Option<PathBuf>,

    /// Inline contact, NAME or NAME:alias1,alias2 (repeatable)
    #[arg(long = "contact")]
    contacts: Vec<String>,

    /// Parse TEXT as a time expression instead of routing it
    #[arg(long)]
    time: bool,

    /// Name used when rendering outgoing messages
    #[arg(long)]
    user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Do not record rejected commands
    #[arg(long = "no-failed-log")]
    no_failed_log: bool,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// "Monica:mi hija,moni" → Monica with two aliases
fn parse_contact_arg(raw: &str) -> Result<Contact> {
    let (name, aliases) = match raw.split_once(':') {
        Some((name, aliases)) => (name, aliases),
        None => (raw, ""),
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid --contact '{}': missing name", raw);
    }
    Ok(Contact {
        display_name: name.to_string(),
        aliases: aliases
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// SQLite store if a database is given, else inline/config contacts, else none
fn build_directory(args: &Args, config: &RouterConfig) -> Result<Option<ContactDirectory>> {
    if let Some(path) = args.contacts_db.as_ref().or(config.contacts.database.as_ref()) {
        let store = SqliteContactStore::open(path)
            .with_context(|| format!("failed to open contact database {}", path.display()))?;
        return Ok(Some(ContactDirectory::with_normalizer(Box::new(store))));
    }

    let mut entries = config.contacts.entries.clone();
    for raw in &args.contacts {
        entries.push(parse_contact_arg(raw)?);
    }
    if entries.is_empty() {
        tracing::debug!("No contacts configured, contact validation disabled");
        return Ok(None);
    }
    tracing::debug!(count = entries.len(), "Using inline contacts");
    Ok(Some(ContactDirectory::with_normalizer(Box::new(
        InMemoryContactStore::new(entries),
    ))))
}

// ============================================================================
// Failed Command Log
// ============================================================================

fn format_failed_entry(at: NaiveDateTime, user: &str, text: &str, reason: &str) -> String {
    format!(
        "{} [Usuario: {}] - FALLÓ: '{}' [Razón: {}]\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        user,
        text,
        reason
    )
}

fn failed_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR).join(FAILED_LOG_FILE))
}

fn append_failed_entry(path: &Path, entry: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())?;
    Ok(())
}

fn log_failed_command(session: &Session, text: &str, reason: &str) {
    let Some(path) = failed_log_path() else {
        tracing::warn!("No data directory, failed command not recorded");
        return;
    };
    let entry = format_failed_entry(Local::now().naive_local(), &session.user_name, text, reason);
    if let Err(e) = append_failed_entry(&path, &entry) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to record failed command");
    }
}

// ============================================================================
// Modes
// ============================================================================

fn run_time(text: &str) -> Result<()> {
    let parsed = time::parse(text);
    let (confirmation, resolution) = match (parsed.success, parsed.hour) {
        (true, Some(hour)) => (
            Some(time::format_confirmation(hour, parsed.minute, parsed.day_offset)),
            Some(time::resolve_datetime(hour, parsed.minute, parsed.day_offset)),
        ),
        _ => (None, None),
    };

    let output = serde_json::json!({
        "parse": parsed,
        "confirmation": confirmation,
        "resolution": resolution,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_route(args: &Args, config: &RouterConfig, session: &Session) -> Result<()> {
    let router = CommandRouter::with_directory(config, build_directory(args, config)?);

    let routed = router.route(session, &args.text);

    println!("Routing Decision:");
    println!("{}", serde_json::to_string_pretty(&routed)?);

    match &routed.decision {
        Decision::SendMessage { contact, outgoing, .. } => {
            println!("\nOutgoing Message ({}):", contact);
            println!("{}", outgoing);
        }
        Decision::Intent {
            reminder: Some(draft),
            ..
        } => {
            println!("\nReminder:");
            match draft.confirmation() {
                Some(confirmation) => println!("{}", confirmation),
                None => println!("(sin hora)"),
            }
            println!("{}", serde_json::to_string_pretty(&draft.resolve())?);
        }
        Decision::Reject { reason } if !args.no_failed_log => {
            log_failed_command(session, &args.text, reason);
        }
        _ => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);

    if args.time {
        return run_time(&args.text);
    }

    let config = RouterConfig::load(args.config.as_deref()).context("failed to load config")?;
    let session = match &args.user {
        Some(user) => Session::new(user.clone()),
        None => Session::from_config(&config.session),
    };
    tracing::debug!(user = %session.user_name, "Session started");

    run_route(&args, &config, &session)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["kata-router"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_parse_contact_arg_with_aliases() {
        let contact = parse_contact_arg("Monica: mi hija , moni").unwrap();
        assert_eq!(contact.display_name, "Monica");
        assert_eq!(contact.aliases, vec!["mi hija".to_string(), "moni".to_string()]);
    }

    #[test]
    fn test_parse_contact_arg_name_only() {
        let contact = parse_contact_arg("Luis").unwrap();
        assert_eq!(contact.display_name, "Luis");
        assert!(contact.aliases.is_empty());
    }

    #[test]
    fn test_parse_contact_arg_missing_name() {
        assert!(parse_contact_arg(":moni").is_err());
    }

    #[test]
    fn test_args_verbosity_and_contacts() {
        let args = args(&["-vv", "--contact", "Ana", "--contact", "Luis:mi hermano", "hola"]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.contacts.len(), 2);
        assert_eq!(args.text, "hola");
        assert!(!args.time);
    }

    #[test]
    fn test_build_directory_from_inline_contacts() {
        let args = args(&["--contact", "Luis:mi hermano", "hola"]);
        let directory = build_directory(&args, &RouterConfig::default()).unwrap().unwrap();
        assert_eq!(directory.resolve("mi hermano").unwrap(), Some("Luis".to_string()));
    }

    #[test]
    fn test_build_directory_none_without_contacts() {
        let args = args(&["hola"]);
        assert!(build_directory(&args, &RouterConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_format_failed_entry() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        assert_eq!(
            format_failed_entry(at, "Marina", "cuéntame un chiste", "Comando no reconocido"),
            "2024-05-10 09:05:03 [Usuario: Marina] - FALLÓ: 'cuéntame un chiste' [Razón: Comando no reconocido]\n"
        );
    }

    #[test]
    fn test_append_failed_entry_creates_file() {
        let dir = std::env::temp_dir().join(format!("kata-router-test-{}", std::process::id()));
        let path = dir.join("nested").join(FAILED_LOG_FILE);
        append_failed_entry(&path, "uno\n").unwrap();
        append_failed_entry(&path, "dos\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "uno\ndos\n");
        fs::remove_dir_all(&dir).unwrap();
    }
}
