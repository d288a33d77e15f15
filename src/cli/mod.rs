//! CLI definitions and command implementations for rbsync.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rbsync - Mirror your Rhythmbox library to another machine
#[derive(Parser)]
#[command(name = "rbsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/rbsync/rbsync.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export playlists, rewrite paths and mirror everything to the remote
    Run(RunArgs),

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config and print what a run would do
    Check,

    /// Translate values the way library and playlist paths are translated
    Translate {
        /// Values to translate
        #[arg(required = true)]
        values: Vec<String>,
    },
}

/// Switches that override the `[phases]` section for one run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Log mirror commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Run mirror commands even if the config says dry_run
    #[arg(long, conflicts_with = "dry_run")]
    pub no_dry_run: bool,

    /// Keep the scratch workspace after the run
    #[arg(long)]
    pub keep_workspace: bool,

    #[arg(long)]
    pub skip_export: bool,

    /// Sync rhythmdb.xml, playlists.xml and cover art
    #[arg(long, conflicts_with = "skip_library")]
    pub library: bool,

    #[arg(long)]
    pub skip_library: bool,

    #[arg(long)]
    pub skip_media: bool,

    #[arg(long)]
    pub skip_playlists: bool,
}
