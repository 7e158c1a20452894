//! Update orchestration
//!
//! The implicit path (`update_if_needed`) runs before ordinary commands:
//! staleness check, package hook, manifest fetch, then install when the
//! channel has moved on. A failing package hook is only logged there. The
//! explicit `update` command stops on it, and otherwise always installs the
//! channel's current build.

use keel_core::config::DEFAULT_CHANNEL;
use keel_core::AppConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::download::BinaryDownloader;
use crate::error::Result;
use crate::installer::{InstallReceipt, Installer};
use crate::manifest::{Manifest, ManifestClient};
use crate::packages::PackageUpdater;
use crate::staleness;
use crate::version::is_downgrade;

/// Result of an update attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The installed binary is fresh enough, or a development build
    NotNeeded,

    /// The channel is at the running version; the binary's timestamp was refreshed
    UpToDate { version: String },

    /// A newer release exists but this process was not started from the
    /// canonical binary, so it is left alone
    NotUpdatable { running: String, latest: String },

    /// A new build was installed at the canonical path
    Installed {
        from: String,
        to: String,
        channel: String,
        bin_path: PathBuf,
    },
}

/// Self-update manager
pub struct Updater<'a, P: PackageUpdater> {
    config: &'a AppConfig,
    client: reqwest::Client,
    manifests: ManifestClient,
    packages: P,
    show_progress: bool,
    current_exe: Option<PathBuf>,
}

impl<'a, P: PackageUpdater> Updater<'a, P> {
    /// Create an updater bound to the process configuration
    pub fn new(config: &'a AppConfig, packages: P) -> Result<Self> {
        let client = crate::http_client(config)?;
        let manifests = ManifestClient::new(client.clone(), config.update_host.clone());

        debug!(
            "Updater initialized: version={}, channel={}, path={:?}",
            config.version, config.channel, config.paths.bin
        );

        Ok(Self {
            config,
            client,
            manifests,
            packages,
            show_progress: false,
            current_exe: None,
        })
    }

    /// Enable or disable the download progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Override the path of the running executable
    pub fn with_current_exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_exe = Some(path.into());
        self
    }

    pub fn config(&self) -> &AppConfig {
        self.config
    }

    fn installer(&self) -> Installer<'a> {
        let downloader =
            BinaryDownloader::new(self.client.clone()).with_progress(self.show_progress);
        Installer::new(&self.config.paths, downloader)
    }

    /// Check for and install a new release if the binary is stale
    pub async fn update_if_needed(&self) -> Result<UpdateOutcome> {
        if !staleness::update_needed(self.config) {
            return Ok(UpdateOutcome::NotNeeded);
        }

        // A failing hook must not hold back the binary itself
        if let Err(e) = self.update_packages() {
            warn!("{}", e);
        }
        let manifest = self.fetch_manifest(&self.config.channel).await?;

        if manifest.version == self.config.version {
            debug!("Already on {}", manifest.version);
            self.installer().refresh_timestamp()?;
            return Ok(UpdateOutcome::UpToDate {
                version: manifest.version,
            });
        }

        if !self.is_updatable() {
            return Ok(UpdateOutcome::NotUpdatable {
                running: self.config.version.clone(),
                latest: manifest.version,
            });
        }

        self.install_manifest(&manifest).await?;
        Ok(UpdateOutcome::Installed {
            from: self.config.version.clone(),
            to: manifest.version,
            channel: manifest.channel,
            bin_path: self.config.paths.bin.clone(),
        })
    }

    /// Update packages, then install the channel's build unconditionally
    pub async fn update(&self, channel: &str) -> Result<UpdateOutcome> {
        self.update_packages()?;
        let manifest = self.fetch_manifest(channel).await?;
        self.install_manifest(&manifest).await?;

        Ok(UpdateOutcome::Installed {
            from: self.config.version.clone(),
            to: manifest.version,
            channel: manifest.channel,
            bin_path: self.config.paths.bin.clone(),
        })
    }

    /// Run the package/plugin collaborator
    pub fn update_packages(&self) -> Result<()> {
        self.packages.update_packages()
    }

    /// Fetch the manifest for a channel
    pub async fn fetch_manifest(&self, channel: &str) -> Result<Manifest> {
        self.manifests.fetch(channel).await
    }

    /// Select this platform's build and install it
    pub async fn install_manifest(&self, manifest: &Manifest) -> Result<InstallReceipt> {
        if is_downgrade(&self.config.version, &manifest.version) {
            info!(
                "Channel {} is at {}, older than running {}",
                manifest.channel, manifest.version, self.config.version
            );
        }

        let build = manifest.select_build(&self.config.platform)?;
        debug!(
            "Installing {} ({}) for {}",
            manifest.version, manifest.channel, self.config.platform
        );
        self.installer().install(&build).await
    }

    /// Finish an install interrupted mid-swap
    pub fn recover(&self) -> Result<bool> {
        self.installer().recover_interrupted_install()
    }

    /// Whether this process runs from the canonical binary
    pub fn is_updatable(&self) -> bool {
        let exe = match &self.current_exe {
            Some(path) => path.clone(),
            None => match env::current_exe() {
                Ok(path) => path,
                Err(e) => {
                    debug!("Cannot determine current executable: {}", e);
                    return false;
                }
            },
        };
        same_file(&exe, &self.config.paths.bin)
    }
}

/// Channel to use when the command line may leave it empty
pub fn channel_or_default(channel: Option<&str>) -> &str {
    match channel {
        Some(c) if !c.trim().is_empty() => c,
        _ => DEFAULT_CHANNEL,
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
