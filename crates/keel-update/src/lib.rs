//! Self-update functionality for the Keel CLI
//!
//! Provides:
//! - Staleness check gating automatic update checks
//! - Release manifest fetching and per-platform build selection
//! - Streaming gzip download into a staging file
//! - SHA1 integrity verification of the staged binary
//! - Lock-guarded installation with an atomic swap where available
//! - Recovery of an install interrupted between remove and rename
//! - Re-exec of the freshly installed binary

pub mod download;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod packages;
pub mod relaunch;
pub mod staleness;
pub mod updater;
pub mod verify;
pub mod version;

pub use download::BinaryDownloader;
pub use error::{ErrorKind, Result, UpdateError};
pub use installer::{InstallAttempt, InstallReceipt, InstallState, Installer, UpdateLock};
pub use manifest::{Build, Manifest, ManifestClient};
pub use packages::{HookPackageUpdater, PackageUpdater};
pub use updater::{channel_or_default, UpdateOutcome, Updater};
pub use version::VersionInfo;

/// Build the HTTP client shared by the manifest fetcher and downloader
pub fn http_client(config: &keel_core::AppConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
    if let Some(timeout) = config.http_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|source| UpdateError::Network {
        context: "building HTTP client".to_string(),
        source,
    })
}
