//! Process configuration
//!
//! `AppConfig` is constructed once at startup by [`ConfigLoader`] and then
//! passed by reference to every component that needs it.

mod loader;
mod types;

pub use loader::{ConfigLoader, FileConfig, PackagesSection, UpdateSection};
pub use types::{
    running_version, AppConfig, InstallPaths, Platform, BIN_NAME, DEFAULT_CHANNEL,
    DEFAULT_UPDATE_HOST, DEV_VERSION, LOCK_FILE_NAME, PENDING_SUFFIX, STAGING_SUFFIX,
    STALE_AFTER,
};
