//! Configuration types shared by the CLI and the update subsystem

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Running version of development builds; these never self-update
pub const DEV_VERSION: &str = "dev";

/// Channel used when none is configured or given on the command line
pub const DEFAULT_CHANNEL: &str = "stable";

/// Host serving `/<channel>/manifest.json`
pub const DEFAULT_UPDATE_HOST: &str = "https://releases.keel.sh";

/// Age after which the installed binary is considered stale
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// File name of the canonical binary, without executable suffix
pub const BIN_NAME: &str = "keel";

/// Suffix appended to the canonical binary path for the staging file
pub const STAGING_SUFFIX: &str = "~";

/// Suffix of a verified build waiting to be moved into place
pub const PENDING_SUFFIX: &str = ".new";

/// Lock file guarding installs, inside the application directory
pub const LOCK_FILE_NAME: &str = "updating.lock";

/// Filesystem locations owned by the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// Application state directory (e.g. `~/.keel`)
    pub app_dir: PathBuf,

    /// Canonical binary the tool executes itself from
    pub bin: PathBuf,

    /// Staging file the downloader writes into
    pub staging: PathBuf,

    /// Staging file after it passed verification, until the swap completes
    pub pending: PathBuf,

    /// Advisory lock file for install attempts
    pub lock: PathBuf,
}

impl InstallPaths {
    /// Derive all paths from the application directory.
    ///
    /// The platform executable suffix is applied here, once.
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        let app_dir = app_dir.into();
        let bin = app_dir.join(format!("{}{}", BIN_NAME, std::env::consts::EXE_SUFFIX));
        let staging = with_suffix(&bin, STAGING_SUFFIX);
        let pending = with_suffix(&bin, PENDING_SUFFIX);
        let lock = app_dir.join(LOCK_FILE_NAME);

        Self {
            app_dir,
            bin,
            staging,
            pending,
            lock,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Operating system and architecture as named in release manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running process
    pub fn current() -> Self {
        Self::from_rust(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust target identifiers onto manifest keys
    pub fn from_rust(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Self::new(os, arch)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Immutable process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Version of the running binary (`DEV_VERSION` for development builds)
    pub version: String,

    /// Release channel checked by the implicit update path
    pub channel: String,

    /// Base URL of the release host
    pub update_host: String,

    /// Staleness threshold for the installed binary
    pub stale_after: Duration,

    /// Optional HTTP timeout; unset means requests may block indefinitely
    pub http_timeout: Option<Duration>,

    /// User agent string for HTTP requests
    pub user_agent: String,

    /// Platform the build selector resolves against
    pub platform: Platform,

    /// Installer-owned paths
    pub paths: InstallPaths,

    /// Command line run as the package/plugin updater
    pub package_hook: Option<Vec<String>>,
}

impl AppConfig {
    /// Build a configuration with defaults rooted at `app_dir`
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: running_version().to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            update_host: DEFAULT_UPDATE_HOST.to_string(),
            stale_after: STALE_AFTER,
            http_timeout: None,
            user_agent: default_user_agent(),
            platform: Platform::current(),
            paths: InstallPaths::new(app_dir),
            package_hook: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_update_host(mut self, host: impl Into<String>) -> Self {
        self.update_host = host.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_package_hook(mut self, hook: Vec<String>) -> Self {
        self.package_hook = Some(hook);
        self
    }

    /// Whether the running binary is a development build
    pub fn is_dev_build(&self) -> bool {
        self.version == DEV_VERSION
    }
}

/// Version stamped in by release builds
pub fn running_version() -> &'static str {
    option_env!("KEEL_RELEASE_VERSION").unwrap_or(DEV_VERSION)
}

fn default_user_agent() -> String {
    format!(
        "keel/{} ({}; {})",
        running_version(),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_paths_layout() {
        let paths = InstallPaths::new("/opt/keel");
        let exe = format!("keel{}", std::env::consts::EXE_SUFFIX);

        assert_eq!(paths.bin, PathBuf::from("/opt/keel").join(&exe));
        assert_eq!(
            paths.staging,
            PathBuf::from("/opt/keel").join(format!("{}~", exe))
        );
        assert_eq!(
            paths.pending,
            PathBuf::from("/opt/keel").join(format!("{}.new", exe))
        );
        assert_eq!(paths.lock, PathBuf::from("/opt/keel/updating.lock"));
    }

    #[test]
    fn test_platform_mapping() {
        assert_eq!(
            Platform::from_rust("linux", "x86_64"),
            Platform::new("linux", "amd64")
        );
        assert_eq!(
            Platform::from_rust("macos", "aarch64"),
            Platform::new("darwin", "arm64")
        );
        assert_eq!(
            Platform::from_rust("windows", "x86"),
            Platform::new("windows", "386")
        );
        assert_eq!(
            Platform::from_rust("freebsd", "riscv64"),
            Platform::new("freebsd", "riscv64")
        );
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::new("linux", "amd64").to_string(), "linux/amd64");
    }

    #[test]
    fn test_dev_build_detection() {
        let config = AppConfig::new("/tmp/keel").with_version(DEV_VERSION);
        assert!(config.is_dev_build());

        let config = config.with_version("1.0.0");
        assert!(!config.is_dev_build());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::new("/tmp/keel");
        assert_eq!(config.channel, DEFAULT_CHANNEL);
        assert_eq!(config.update_host, DEFAULT_UPDATE_HOST);
        assert_eq!(config.stale_after, Duration::from_secs(3600));
        assert!(config.http_timeout.is_none());
        assert!(config.package_hook.is_none());
        assert!(config.user_agent.starts_with("keel/"));
    }
}
