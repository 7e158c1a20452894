//! Package/plugin updater run before every manifest fetch

use anyhow::{anyhow, Context};
use std::process::Command;
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Opaque collaborator that updates installed packages or plugins
///
/// It must finish, successfully or not, before the manifest is fetched.
pub trait PackageUpdater {
    fn update_packages(&self) -> Result<()>;
}

/// Runs a configured command line with inherited stdio
#[derive(Debug, Clone, Default)]
pub struct HookPackageUpdater {
    command: Option<Vec<String>>,
}

impl HookPackageUpdater {
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self { command }
    }
}

impl PackageUpdater for HookPackageUpdater {
    fn update_packages(&self) -> Result<()> {
        let Some((program, args)) = self.command.as_deref().and_then(|c| c.split_first()) else {
            debug!("No package hook configured");
            return Ok(());
        };

        debug!("Running package hook: {} {:?}", program, args);
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to run package hook `{}`", program))
            .map_err(UpdateError::Packages)?;

        if !status.success() {
            return Err(UpdateError::Packages(anyhow!(
                "`{}` exited with code {}",
                program,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}
