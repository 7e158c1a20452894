//! Lock-guarded installation of a verified build
//!
//! One install attempt runs
//! `Idle → Locking → Downloading → Verifying → Installing → Done`;
//! a failure at any step moves it to `Aborted`. There is no retry edge,
//! callers re-run the whole attempt.
//!
//! The installer is the only component that touches the canonical binary,
//! the staging file, and the lock file.

use fs4::fs_std::FileExt;
use keel_core::InstallPaths;
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::download::BinaryDownloader;
use crate::error::{Result, UpdateError};
use crate::manifest::Build;
use crate::verify::verify_sha1;

/// Exclusive, non-blocking advisory lock on a fixed file
///
/// The OS drops the lock when the process dies, so a crashed attempt never
/// blocks later ones. Dropping the guard releases it.
#[derive(Debug)]
pub struct UpdateLock {
    file: File,
    path: PathBuf,
}

impl UpdateLock {
    /// Take the lock or fail immediately if another holder exists
    pub fn try_acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| UpdateError::LockFile {
                path: path.to_path_buf(),
                source,
            })?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(true) => {}
            Ok(false) => {
                return Err(UpdateError::LockContended {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err(UpdateError::LockContended {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(UpdateError::LockFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        debug!("Acquired update lock {:?}", path);
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release update lock {:?}: {}", self.path, e);
        } else {
            debug!("Released update lock {:?}", self.path);
        }
    }
}

/// Step of an install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Locking,
    Downloading,
    Verifying,
    Installing,
    Done,
    Aborted,
}

impl InstallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl std::fmt::Display for InstallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Locking => "locking",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Installing => "installing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Record of the states one install attempt went through
#[derive(Debug, Clone)]
pub struct InstallAttempt {
    history: Vec<InstallState>,
}

impl InstallAttempt {
    pub fn new() -> Self {
        Self {
            history: vec![InstallState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> InstallState {
        self.history
            .last()
            .copied()
            .unwrap_or(InstallState::Idle)
    }

    pub fn history(&self) -> &[InstallState] {
        &self.history
    }

    fn advance(&mut self, next: InstallState) {
        let current = self.state();
        if current.is_terminal() {
            return;
        }
        debug!("Install attempt: {} -> {}", current, next);
        self.history.push(next);
    }

    fn abort(&mut self, err: &UpdateError) {
        warn!("Install attempt aborted while {}: {}", self.state(), err);
        self.advance(InstallState::Aborted);
    }
}

impl Default for InstallAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful install
#[derive(Debug, Clone)]
pub struct InstallReceipt {
    /// Canonical binary that now holds the build
    pub bin_path: PathBuf,

    /// Digest the installed binary was verified against
    pub sha1: String,
}

/// Replaces the canonical binary with a downloaded and verified build
pub struct Installer<'a> {
    paths: &'a InstallPaths,
    downloader: BinaryDownloader,
}

impl<'a> Installer<'a> {
    pub fn new(paths: &'a InstallPaths, downloader: BinaryDownloader) -> Self {
        Self { paths, downloader }
    }

    pub fn paths(&self) -> &InstallPaths {
        self.paths
    }

    /// Download, verify, and install a build under the update lock
    pub async fn install(&self, build: &Build) -> Result<InstallReceipt> {
        let mut attempt = InstallAttempt::new();
        self.install_tracked(build, &mut attempt).await
    }

    /// Same as [`Installer::install`], recording every state transition
    pub async fn install_tracked(
        &self,
        build: &Build,
        attempt: &mut InstallAttempt,
    ) -> Result<InstallReceipt> {
        match self.run(build, attempt).await {
            Ok(receipt) => {
                attempt.advance(InstallState::Done);
                info!("Installed {:?}", receipt.bin_path);
                Ok(receipt)
            }
            Err(e) => {
                attempt.abort(&e);
                Err(e)
            }
        }
    }

    async fn run(&self, build: &Build, attempt: &mut InstallAttempt) -> Result<InstallReceipt> {
        attempt.advance(InstallState::Locking);
        fs::create_dir_all(&self.paths.app_dir)
            .map_err(|e| UpdateError::filesystem("create", &self.paths.app_dir, e))?;
        let _lock = UpdateLock::try_acquire(&self.paths.lock)?;

        attempt.advance(InstallState::Downloading);
        let staged = match self
            .downloader
            .download(&build.url, &self.paths.staging)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                self.discard_staging();
                return Err(e);
            }
        };

        attempt.advance(InstallState::Verifying);
        if let Err(e) = verify_sha1(&staged, &build.sha1) {
            self.discard_staging();
            return Err(e);
        }

        attempt.advance(InstallState::Installing);
        self.swap()?;

        Ok(InstallReceipt {
            bin_path: self.paths.bin.clone(),
            sha1: build.sha1.to_ascii_lowercase(),
        })
    }

    /// Move the staging file over the canonical binary
    #[cfg(unix)]
    fn swap(&self) -> Result<()> {
        debug!(
            "Replacing binary: {:?} -> {:?}",
            self.paths.staging, self.paths.bin
        );
        fs::rename(&self.paths.staging, &self.paths.bin)
            .map_err(|e| UpdateError::filesystem("rename", &self.paths.staging, e))
    }

    /// Move the staging file over the canonical binary
    ///
    /// The verified build is parked at the pending path first, so a crash
    /// after the old binary is gone leaves only verified bytes to recover.
    /// A running executable cannot be removed but can be moved aside.
    #[cfg(not(unix))]
    fn swap(&self) -> Result<()> {
        debug!(
            "Replacing binary: {:?} -> {:?}",
            self.paths.pending, self.paths.bin
        );
        fs::rename(&self.paths.staging, &self.paths.pending)
            .map_err(|e| UpdateError::filesystem("rename", &self.paths.staging, e))?;

        let aside = self.remove_old_binary()?;
        fs::rename(&self.paths.pending, &self.paths.bin)
            .map_err(|e| UpdateError::filesystem("rename", &self.paths.pending, e))?;

        if let Some(aside) = aside {
            match fs::remove_file(&aside) {
                Ok(()) => debug!("Removed previous binary {:?}", aside),
                Err(e) => debug!("Could not remove previous binary {:?}: {}", aside, e),
            }
        }
        Ok(())
    }

    /// Clear the canonical path, returning where the old binary was moved
    /// if it could only be moved aside
    #[cfg(not(unix))]
    fn remove_old_binary(&self) -> Result<Option<PathBuf>> {
        match fs::remove_file(&self.paths.bin) {
            Ok(()) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                let aside = self.paths.bin.with_extension("old");
                if let Err(e) = fs::remove_file(&aside) {
                    if e.kind() != io::ErrorKind::NotFound {
                        debug!("Could not remove stale {:?}: {}", aside, e);
                    }
                }
                fs::rename(&self.paths.bin, &aside)
                    .map_err(|e| UpdateError::filesystem("move aside", &self.paths.bin, e))?;
                Ok(Some(aside))
            }
            Err(e) => Err(UpdateError::filesystem("remove", &self.paths.bin, e)),
        }
    }

    /// Remove a staging file that must never be promoted
    fn discard_staging(&self) {
        match fs::remove_file(&self.paths.staging) {
            Ok(()) => debug!("Removed staging file {:?}", self.paths.staging),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staging file {:?}: {}",
                self.paths.staging, e
            ),
        }
    }

    /// Finish an install interrupted between removing the old binary and
    /// moving the new one into place
    ///
    /// The swap here is a single rename, so the canonical binary is never
    /// missing because of an install and there is nothing to recover.
    #[cfg(unix)]
    pub fn recover_interrupted_install(&self) -> Result<bool> {
        Ok(false)
    }

    /// Finish an install interrupted between removing the old binary and
    /// moving the new one into place
    ///
    /// Only the pending path is promoted; it holds bytes that already passed
    /// verification. The staging file is never trusted. Returns whether
    /// anything was promoted; a contended lock means an install is in flight
    /// and nothing is done.
    #[cfg(not(unix))]
    pub fn recover_interrupted_install(&self) -> Result<bool> {
        if self.paths.bin.exists() || !self.paths.pending.exists() {
            return Ok(false);
        }

        let _lock = match UpdateLock::try_acquire(&self.paths.lock) {
            Ok(lock) => lock,
            Err(UpdateError::LockContended { .. }) => {
                debug!("Update in progress, skipping recovery");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if self.paths.bin.exists() || !self.paths.pending.exists() {
            return Ok(false);
        }

        warn!(
            "Binary missing at {:?}; promoting verified update",
            self.paths.bin
        );
        fs::rename(&self.paths.pending, &self.paths.bin)
            .map_err(|e| UpdateError::filesystem("rename", &self.paths.pending, e))?;
        Ok(true)
    }

    /// Mark the canonical binary as freshly checked
    pub fn refresh_timestamp(&self) -> Result<()> {
        let now = SystemTime::now();
        let file = open_for_times(&self.paths.bin)
            .map_err(|e| UpdateError::filesystem("open", &self.paths.bin, e))?;
        file.set_times(FileTimes::new().set_accessed(now).set_modified(now))
            .map_err(|e| UpdateError::filesystem("touch", &self.paths.bin, e))?;
        debug!("Refreshed timestamp of {:?}", self.paths.bin);
        Ok(())
    }
}

/// Open a handle that may change timestamps without writing content
///
/// The binary is usually the running executable, which cannot be opened
/// for writing on Unix.
#[cfg(not(windows))]
fn open_for_times(path: &Path) -> io::Result<File> {
    File::open(path)
}

#[cfg(windows)]
fn open_for_times(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;
    OpenOptions::new()
        .access_mode(FILE_WRITE_ATTRIBUTES)
        .open(path)
}
