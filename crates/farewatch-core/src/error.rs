//! Error types for Farewatch

use thiserror::Error;

/// Result type alias using Farewatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Farewatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file parse error
    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream API returned a payload we could not use
    #[error("Upstream error from {source_name}: {message}")]
    Upstream {
        /// Which fetcher hit the error
        source_name: String,
        /// What the upstream reported
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
