//! Update check that runs before ordinary commands
//!
//! Failures here never fail the user's command; they are logged and the
//! command runs on the current binary.

use keel_update::relaunch::relaunch;
use keel_update::{PackageUpdater, UpdateOutcome, Updater};
use std::env;
use std::process::ExitStatus;
use tracing::{debug, warn};

use crate::output;

/// What the caller should do after the pre-command check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Run the requested command in this process
    Continue,

    /// The command already ran in the relaunched binary; exit with this code
    Exit(i32),
}

/// Promote a staged binary left behind by an interrupted install
pub fn recover<P: PackageUpdater>(updater: &Updater<'_, P>) {
    match updater.recover() {
        Ok(true) => debug!("Recovered interrupted install"),
        Ok(false) => {}
        Err(e) => warn!("Could not recover interrupted install: {}", e),
    }
}

/// Update the CLI if it is stale, relaunching into the new binary
pub async fn check<P: PackageUpdater>(updater: &Updater<'_, P>) -> Next {
    let outcome = match updater.update_if_needed().await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Automatic update failed: {}", e);
            return Next::Continue;
        }
    };

    match outcome {
        UpdateOutcome::NotNeeded | UpdateOutcome::UpToDate { .. } => Next::Continue,
        UpdateOutcome::NotUpdatable { running, latest } => {
            output::warning(&out_of_date_message(&running, &latest));
            Next::Continue
        }
        UpdateOutcome::Installed {
            to,
            channel,
            bin_path,
            ..
        } => {
            debug!("Updated to {} ({}), relaunching", to, channel);
            match relaunch(&bin_path, env::args_os().skip(1)) {
                Ok(status) => Next::Exit(exit_code(status)),
                Err(e) => {
                    warn!("Could not start updated binary: {}", e);
                    Next::Continue
                }
            }
        }
    }
}

pub fn out_of_date_message(running: &str, latest: &str) -> String {
    format!(
        "Out of date: You are running {} but {} is out.",
        running, latest
    )
}

/// The relaunched command reports its own failures
fn exit_code(status: ExitStatus) -> i32 {
    if !status.success() {
        warn!("Updated binary exited with {}", status);
    }
    0
}
