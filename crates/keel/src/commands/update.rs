//! Update command

use anyhow::Result;
use keel_update::{channel_or_default, PackageUpdater, Updater};
use tracing::debug;

use crate::cli::UpdateArgs;
use crate::output;

/// Update packages, then reinstall the channel's current build
///
/// The new binary takes effect on the next invocation.
pub async fn run<P: PackageUpdater>(
    updater: &Updater<'_, P>,
    args: UpdateArgs,
    quiet: bool,
) -> Result<()> {
    let channel = channel_or_default(args.channel.as_deref());

    let msg = "updating plugins";
    let pb = output::step(msg, quiet);
    // Hook output shares the terminal with the spinner
    if let Err(e) = pb.suspend(|| updater.update_packages()) {
        output::step_failed(&pb);
        return Err(e.into());
    }
    output::step_done(&pb, msg);

    let manifest = updater.fetch_manifest(channel).await?;

    // The downloader draws its own byte progress bar for this step
    let msg = format!("updating to {} ({})", manifest.version, manifest.channel);
    output::progress(&msg);
    let receipt = updater.install_manifest(&manifest).await?;
    debug!("Installed {:?} (sha1 {})", receipt.bin_path, receipt.sha1);
    output::progress_done(&msg);

    Ok(())
}
