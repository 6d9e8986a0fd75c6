//! Router configuration
//!
//! Loaded from `kata_router.toml` (working directory first, then the user
//! config directory), with environment overrides applied on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::contacts::Contact;
use crate::error::{Error, Result};
use crate::types::{Intent, IntentCategory};

/// Config file name
pub const CONFIG_FILE: &str = "kata_router.toml";

/// Subdirectory of the user config/data directory
pub const APP_DIR: &str = "kata-router";

// ============================================================================
// Sections
// ============================================================================

/// Full router configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub generative: GenerativeConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// [generative] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Classic matches at or above this confidence skip the fallback
    #[serde(default = "default_min_classic_confidence")]
    pub min_classic_confidence: f32,
}

fn default_min_classic_confidence() -> f32 { 0.85 }

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_classic_confidence: default_min_classic_confidence(),
        }
    }
}

/// [routing] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoutingConfig {
    /// Categories never sent to the generative fallback
    #[serde(default = "default_always_classic")]
    pub always_classic: Vec<IntentCategory>,
    /// Intents never sent to the generative fallback
    #[serde(default = "default_never_generative")]
    pub never_generative: Vec<Intent>,
    /// Utterances containing any of these stay classic
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: Vec<String>,
    /// Inferred commands below this confidence are dropped
    #[serde(default)]
    pub min_inference_confidence: f32,
}

fn default_always_classic() -> Vec<IntentCategory> {
    vec![
        IntentCategory::Recordatorio,
        IntentCategory::Medicacion,
        IntentCategory::ContactoEmergencia,
        IntentCategory::Fecha,
        IntentCategory::Hora,
        IntentCategory::Enchufe,
    ]
}

fn default_never_generative() -> Vec<Intent> {
    vec![Intent::EmergencyAlert, Intent::ShutdownDevice, Intent::ReadMessages]
}

fn default_critical_keywords() -> Vec<String> {
    ["emergencia", "ayuda", "socorro", "urgente", "medicación"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            always_classic: default_always_classic(),
            never_generative: default_never_generative(),
            critical_keywords: default_critical_keywords(),
            min_inference_confidence: 0.0,
        }
    }
}

/// [contacts] section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactsConfig {
    /// SQLite database with a `contacts` table
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub entries: Vec<Contact>,
}

/// [session] section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_user_name")]
    pub user_name: String,
}

fn default_user_name() -> String { "Usuario".to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self { user_name: default_user_name() }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl RouterConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded router config");
        Ok(config)
    }

    /// Load `explicit` if given, else the first discovered config file,
    /// else defaults. Environment overrides are applied in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) if !path.exists() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Self::from_file(path)?,
            None => match discover_config_path() {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// CONFIDENCE_THRESHOLD, GENERATIVE_ENABLED, KATA_USER_NAME
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = get("CONFIDENCE_THRESHOLD") {
            match raw.trim().parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => self.generative.min_classic_confidence = v,
                _ => tracing::warn!(value = %raw, "Ignoring invalid CONFIDENCE_THRESHOLD"),
            }
        }
        if let Some(raw) = get("GENERATIVE_ENABLED") {
            self.generative.enabled = matches!(
                raw.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            );
        }
        if let Some(name) = get("KATA_USER_NAME") {
            let name = name.trim();
            if !name.is_empty() {
                self.session.user_name = name.to_string();
            }
        }
    }
}

/// `./kata_router.toml`, then `<config dir>/kata-router/kata_router.toml`
pub fn discover_config_path() -> Option<PathBuf> {
    let local = std::env::current_dir()
        .map(|p| p.join(CONFIG_FILE))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(CONFIG_FILE))
        .filter(|p| p.exists())
}

// ============================================================================
// Tests
// ============================================================================
