//! Isolated install directories for updater tests

use keel_core::{AppConfig, Platform};
use std::fs::{self, File, FileTimes};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use super::constants::*;

/// Temporary application directory plus a configuration pointing at it
pub struct TestEnv {
    pub dir: TempDir,
    pub config: AppConfig,
}

impl TestEnv {
    /// Configuration for a release build on linux/amd64 talking to `host`
    pub fn new(host: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::new(dir.path())
            .with_version(VERSION_1_0_0)
            .with_update_host(host)
            .with_platform(Platform::new(OS_LINUX, ARCH_AMD64));
        Self { dir, config }
    }

    pub fn with_config(mut self, f: impl FnOnce(AppConfig) -> AppConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Install `content` at the canonical path, last modified `age` ago
    pub fn install_binary(&self, content: &[u8], age: Duration) {
        fs::write(&self.config.paths.bin, content).unwrap();
        set_mtime(&self.config.paths.bin, SystemTime::now() - age);
    }

    /// Install the original binary two hours old
    pub fn install_stale_binary(&self) {
        self.install_binary(ORIGINAL_CONTENT, Duration::from_secs(2 * 3600));
    }

    pub fn bin_content(&self) -> Vec<u8> {
        fs::read(&self.config.paths.bin).unwrap()
    }

    pub fn bin_age(&self) -> Duration {
        let modified = fs::metadata(&self.config.paths.bin)
            .unwrap()
            .modified()
            .unwrap();
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default()
    }
}

pub fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_times(FileTimes::new().set_modified(mtime))
        .unwrap();
}
