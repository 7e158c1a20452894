//! Version command

use crate::cli::VersionArgs;
use anyhow::Result;
use keel_core::AppConfig;
use keel_update::VersionInfo;
use owo_colors::OwoColorize;

use crate::output;

pub fn run(config: &AppConfig, args: VersionArgs) -> Result<()> {
    let info = VersionInfo::from_config(config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.display().bold());
        output::kv("Channel", &info.channel);
        output::kv("Platform", &info.platform);
        output::kv("Binary", &info.bin_path);
        if info.is_dev() {
            println!("{}", "Development build; automatic updates are disabled.".dimmed());
        }
    }

    Ok(())
}
