//! Error types for keel-core

use thiserror::Error;

/// Result type alias using keel-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Keel
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No home directory to derive the application directory from
    #[error("Could not determine home directory (set KEEL_HOME)")]
    HomeDirUnavailable,
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
