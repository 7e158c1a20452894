//! Error types for the update subsystem
//!
//! Every variant except `StaleCheck` aborts the update attempt where it is
//! raised. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the update error
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Errors raised while checking for, fetching, or installing an update
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Transport failure talking to the release host
    #[error("Network error while {context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Release host answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Malformed manifest JSON or gzip stream
    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    /// Digest of the staged binary does not match the manifest
    #[error("SHA mismatch for {path:?}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Another process holds the update lock
    #[error("Another update is already in progress (lock held at {path:?})")]
    LockContended { path: PathBuf },

    /// The lock file could not be created or opened
    #[error("Cannot initialize update lock file {path:?}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Open, write, remove, rename, or timestamp failure
    #[error("Failed to {action} {path:?}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The canonical binary could not be inspected
    #[error("Cannot determine age of {path:?}: {source}")]
    StaleCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest has no build for this platform
    #[error(
        "No build published for {platform} on channel {channel} (available: {})",
        list_or_none(.available)
    )]
    UnsupportedPlatform {
        platform: String,
        channel: String,
        available: Vec<String>,
    },

    /// The package/plugin updater failed
    #[error("Package update failed: {0:#}")]
    Packages(anyhow::Error),
}

/// Coarse classification of [`UpdateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Decode,
    Integrity,
    Lock,
    Filesystem,
    StaleCheck,
    Platform,
    Packages,
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => ErrorKind::Network,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::LockContended { .. } | Self::LockFile { .. } => ErrorKind::Lock,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::StaleCheck { .. } => ErrorKind::StaleCheck,
            Self::UnsupportedPlatform { .. } => ErrorKind::Platform,
            Self::Packages(_) => ErrorKind::Packages,
        }
    }

    /// Whether the error aborts the update attempt
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::StaleCheck
    }

    pub(crate) fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
