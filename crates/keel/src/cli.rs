//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Keel - a command-line tool that keeps itself up to date
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(author, version = keel_core::config::running_version(), about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the pre-command update check applies to this invocation
    pub fn checks_for_updates(&self) -> bool {
        !matches!(self.command, Commands::Update(_))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update the CLI to the latest build of a channel
    Update(UpdateArgs),

    /// Show version information
    Version(VersionArgs),
}

// Update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Release channel (defaults to stable)
    pub channel: Option<String>,
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_channel_is_optional() {
        let cli = Cli::try_parse_from(["keel", "update"]).unwrap();
        match cli.command {
            Commands::Update(args) => assert!(args.channel.is_none()),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["keel", "update", "beta"]).unwrap();
        match cli.command {
            Commands::Update(args) => assert_eq!(args.channel.as_deref(), Some("beta")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_update_command_skips_implicit_check() {
        let update = Cli::try_parse_from(["keel", "update"]).unwrap();
        assert!(!update.checks_for_updates());

        let version = Cli::try_parse_from(["keel", "-v", "version", "--json"]).unwrap();
        assert!(version.checks_for_updates());
        assert_eq!(version.verbose, 1);
    }
}
