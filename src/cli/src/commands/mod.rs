//! CLI command definitions and dispatch.

mod auto_run;
mod version;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use autorun_core::{AutoRunConfig, Result};

pub use auto_run::AutoRunArgs;

/// Autorun - run container images the way their labels ask to be run.
#[derive(Parser, Debug)]
#[command(name = "autorun", version, about)]
pub struct Cli {
    /// Configuration file (default: ~/.autorun/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an image using the options declared in its com.docker.auto.* labels
    AutoRun(auto_run::AutoRunArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler, returning the
/// process exit code.
pub async fn dispatch(cli: Cli, config: &AutoRunConfig) -> Result<i32> {
    match cli.command {
        Command::AutoRun(args) => auto_run::execute(args, config).await,
        Command::Version(args) => version::execute(args).await,
    }
}
