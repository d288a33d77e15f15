//! rbsync CLI - Mirror a Rhythmbox library to another machine
//!
//! Exports playlists from a running Rhythmbox, rewrites local media paths to
//! the remote base path and mirrors everything over rsync.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("rbsync={}", log_level)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => cli::commands::run(cli.config, args)?,
        Commands::Init { force } => cli::commands::init(cli.config, force)?,
        Commands::Check => cli::commands::check(cli.config)?,
        Commands::Translate { values } => cli::commands::translate(cli.config, &values)?,
    }

    Ok(())
}
