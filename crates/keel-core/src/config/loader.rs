//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (<app-dir>/config.yaml)
//! 3. Environment variables (KEEL_* prefix)
//! 4. CLI arguments (handled by caller)

use crate::config::types::AppConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the optional config file inside the application directory
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Contents of `config.yaml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    #[serde(default)]
    pub update: UpdateSection,

    #[serde(default)]
    pub packages: PackagesSection,
}

/// `update:` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateSection {
    pub channel: Option<String>,
    pub host: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

/// `packages:` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackagesSection {
    /// Command run to update packages/plugins before an update check
    pub hook: Option<Vec<String>>,
}

/// Configuration hierarchy loader
pub struct ConfigLoader {
    /// Application state directory
    app_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the standard application directory
    ///
    /// `KEEL_HOME` takes precedence over `~/.keel`.
    pub fn new() -> Result<Self> {
        let app_dir = match env::var_os("KEEL_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(Error::HomeDirUnavailable)?
                .join(".keel"),
        };
        Ok(Self { app_dir })
    }

    /// Create a loader with a custom application directory
    pub fn with_dir(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Load configuration with hierarchical precedence
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::new(&self.app_dir);

        if let Some(file_config) = self.load_file()? {
            config = Self::merge_file_config(config, file_config);
        }

        let config = self.apply_env_overrides(config)?;
        debug!(
            "Configuration loaded: version={}, channel={}, host={}, bin={:?}",
            config.version, config.channel, config.update_host, config.paths.bin
        );
        Ok(config)
    }

    /// Read `config.yaml` if present
    fn load_file(&self) -> Result<Option<FileConfig>> {
        let path = self.app_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Some(FileConfig::default()));
        }

        let file_config: FileConfig = serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(file_config))
    }

    fn merge_file_config(mut config: AppConfig, file: FileConfig) -> AppConfig {
        if let Some(channel) = file.update.channel.filter(|c| !c.is_empty()) {
            config.channel = channel;
        }
        if let Some(host) = file.update.host.filter(|h| !h.is_empty()) {
            config.update_host = host;
        }
        if let Some(secs) = file.update.http_timeout_secs {
            config.http_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(hook) = file.packages.hook.filter(|h| !h.is_empty()) {
            config.package_hook = Some(hook);
        }
        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: AppConfig) -> Result<AppConfig> {
        if let Some(val) = non_empty_var("KEEL_CHANNEL") {
            config.channel = val;
        }

        if let Some(val) = non_empty_var("KEEL_UPDATE_HOST") {
            config.update_host = val;
        }

        if let Some(val) = non_empty_var("KEEL_HTTP_TIMEOUT_SECS") {
            let secs: u64 = val.parse().map_err(|_| {
                Error::invalid_config("KEEL_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(val) = non_empty_var("KEEL_PACKAGE_HOOK") {
            let hook: Vec<String> = val.split_whitespace().map(String::from).collect();
            config.package_hook = Some(hook);
        }

        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
