//! Error types for the router core
//!
//! Only collaborator failures are errors. An utterance that matches nothing is
//! a normal outcome and is reported through `Option` or `success = false`.

use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by collaborators of the routing core
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Contact store could not be read
    #[error("contact store error: {0}")]
    ContactStore(String),

    /// Generative fallback failed to answer
    #[error("generative fallback error: {0}")]
    Generative(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// SQLite error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
