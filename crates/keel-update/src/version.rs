//! Version information and comparison

use keel_core::config::DEV_VERSION;
use keel_core::AppConfig;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Version information for the running CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Release version, or `dev` for development builds
    pub version: String,

    /// Release channel the binary follows
    pub channel: String,

    /// Manifest platform key (`os/arch`)
    pub platform: String,

    /// Canonical binary path
    pub bin_path: String,
}

impl VersionInfo {
    /// Describe the running binary
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            version: config.version.clone(),
            channel: config.channel.clone(),
            platform: config.platform.to_string(),
            bin_path: config.paths.bin.display().to_string(),
        }
    }

    /// Parse semantic version
    pub fn semver(&self) -> Option<Version> {
        parse_version(&self.version)
    }

    pub fn is_dev(&self) -> bool {
        self.version == DEV_VERSION
    }

    /// Format as display string
    pub fn display(&self) -> String {
        format!("keel {} ({}) {}", self.version, self.channel, self.platform)
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Parse a version string, tolerating a leading `v`
pub fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version.trim_start_matches('v')).ok()
}

/// Whether `candidate` is an older release than `running`
///
/// Unparseable versions never count as older.
pub fn is_downgrade(running: &str, candidate: &str) -> bool {
    match (parse_version(running), parse_version(candidate)) {
        (Some(a), Some(b)) => b < a,
        _ => false,
    }
}
