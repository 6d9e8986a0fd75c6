//! Per-conversation context
//!
//! Holds what used to be process-wide state: who is speaking and since when.
//! Passed by reference to the router so several sessions can share one
//! router.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::SessionConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Name used when rendering outgoing messages
    pub user_name: String,
    pub started_at: DateTime<Local>,
}

impl Session {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            started_at: Local::now(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.user_name.clone())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user() {
        assert_eq!(Session::default().user_name, "Usuario");
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            user_name: "Marina".to_string(),
        };
        assert_eq!(Session::from_config(&config).user_name, "Marina");
    }
}
