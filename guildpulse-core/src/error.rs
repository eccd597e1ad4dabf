//! Error types for guildpulse-core

use thiserror::Error;

/// Main error type for the guildpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Guild not found
    #[error("guild not found: {0}")]
    GuildNotFound(String),

    /// A thread panicked while holding the database connection
    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Result type alias for guildpulse-core
pub type Result<T> = std::result::Result<T, Error>;
