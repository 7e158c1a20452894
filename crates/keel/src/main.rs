//! Keel CLI
//!
//! This is the main entry point for the keel command-line interface.

mod auto_update;
mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use keel_core::ConfigLoader;
use keel_update::{HookPackageUpdater, Updater};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use auto_update::Next;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            output::error(&format!("{:#}", e));
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = ConfigLoader::new()?.load()?;
    let packages = HookPackageUpdater::new(config.package_hook.clone());
    let updater = Updater::new(&config, packages)?.with_progress(!cli.quiet);

    auto_update::recover(&updater);

    if cli.checks_for_updates() {
        if let Next::Exit(code) = auto_update::check(&updater).await {
            return Ok(code);
        }
    }

    match cli.command {
        Commands::Update(args) => commands::update::run(&updater, args, cli.quiet).await?,
        Commands::Version(args) => commands::version::run(&config, args)?,
    }
    Ok(0)
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
