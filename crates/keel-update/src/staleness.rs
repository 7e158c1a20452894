//! Decides whether an automatic update check should run

use keel_core::AppConfig;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::error::{Result, UpdateError};

/// Whether the implicit update check should proceed
///
/// Development builds never auto-update. A canonical binary that cannot be
/// inspected is logged and treated as fresh so normal operation continues.
pub fn update_needed(config: &AppConfig) -> bool {
    if config.is_dev_build() {
        debug!("Development build, skipping update check");
        return false;
    }

    match modified_at(&config.paths.bin) {
        Ok(modified) => is_stale(modified, config.stale_after, SystemTime::now()),
        Err(e) => {
            warn!("{}", e);
            warn!("Cannot autoupdate. Try running `keel update` to manually trigger an update.");
            false
        }
    }
}

/// Last modification time of the canonical binary
pub fn modified_at(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| UpdateError::StaleCheck {
            path: path.to_path_buf(),
            source,
        })
}

/// True iff `modified + threshold` lies strictly before `now`
pub fn is_stale(modified: SystemTime, threshold: Duration, now: SystemTime) -> bool {
    match modified.checked_add(threshold) {
        Some(deadline) => deadline < now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::config::DEV_VERSION;
    use std::fs::{File, FileTimes};
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn config_with_binary(dir: &TempDir, version: &str, age: Duration) -> AppConfig {
        let config = AppConfig::new(dir.path()).with_version(version);
        fs::write(&config.paths.bin, b"binary").unwrap();
        let mtime = SystemTime::now() - age;
        File::options()
            .write(true)
            .open(&config.paths.bin)
            .unwrap()
            .set_times(FileTimes::new().set_modified(mtime))
            .unwrap();
        config
    }

    #[test]
    fn test_is_stale_boundaries() {
        let now = SystemTime::now();
        assert!(is_stale(now - Duration::from_secs(3601), HOUR, now));
        assert!(!is_stale(now - Duration::from_secs(3599), HOUR, now));
        assert!(!is_stale(now - HOUR, HOUR, now));
        assert!(!is_stale(now, HOUR, now));
    }

    #[test]
    fn test_old_binary_needs_update() {
        let dir = TempDir::new().unwrap();
        let config = config_with_binary(&dir, "1.0.0", Duration::from_secs(2 * 3600));
        assert!(update_needed(&config));
    }

    #[test]
    fn test_recent_binary_does_not_need_update() {
        let dir = TempDir::new().unwrap();
        let config = config_with_binary(&dir, "1.0.0", Duration::from_secs(10 * 60));
        assert!(!update_needed(&config));
    }

    #[test]
    fn test_dev_build_never_updates() {
        let dir = TempDir::new().unwrap();
        let config = config_with_binary(&dir, DEV_VERSION, Duration::from_secs(48 * 3600));
        assert!(!update_needed(&config));
    }

    #[test]
    fn test_missing_binary_is_not_stale() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::new(dir.path()).with_version("1.0.0");
        assert!(!update_needed(&config));

        let err = modified_at(&config.paths.bin).unwrap_err();
        assert!(!err.is_fatal());
    }
}
