//! Re-exec of the freshly installed binary

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Run the canonical binary with the original arguments and wait for it
///
/// The child shares stdin, stdout, and stderr with this process.
pub fn relaunch<I>(bin_path: &Path, args: I) -> Result<ExitStatus>
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    debug!("Re-executing {:?} with {:?}", bin_path, args);

    Command::new(bin_path)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| UpdateError::filesystem("execute", bin_path, e))
}
