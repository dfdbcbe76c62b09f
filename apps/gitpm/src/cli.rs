//! Command line interface definition

use clap::{Parser, Subcommand};
use gitpm_types::ColorChoice;
use std::path::PathBuf;

/// gitpm - install git-hosted packages into a project manifest
#[derive(Parser)]
#[command(name = "gitpm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install git-hosted packages into a project manifest")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write debug logs to a file in the cache directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root containing Packages/manifest.json
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show every catalog package and whether it is installed
    #[command(alias = "ls")]
    List,

    /// Install a catalog package
    #[command(alias = "i")]
    Install {
        /// Display name or package id
        package: String,
    },

    /// Uninstall a catalog package
    #[command(alias = "rm")]
    Uninstall {
        /// Display name or package id
        package: String,
    },

    /// Print where a catalog package is installed from
    Source {
        /// Display name or package id
        package: String,
    },
}

impl Commands {
    /// Name used in logs and timeout messages
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List => "list",
            Commands::Install { .. } => "install",
            Commands::Uninstall { .. } => "uninstall",
            Commands::Source { .. } => "source",
        }
    }
}
