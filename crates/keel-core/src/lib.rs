//! # keel-core
//!
//! Core library for the Keel CLI providing:
//! - Immutable process configuration built once at startup
//! - Install paths (canonical binary, staging file, update lock)
//! - Platform identifiers as they appear in release manifests
//! - Hierarchical configuration loading (defaults, file, environment)

pub mod config;
pub mod error;

pub use config::{AppConfig, ConfigLoader, InstallPaths, Platform};
pub use error::{Error, Result};
