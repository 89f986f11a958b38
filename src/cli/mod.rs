//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod categories;
pub mod context;
pub mod export;
pub mod status;

pub use args::{ExportArgs, GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// lmexport - Export LogicMonitor LogicModules to local JSON files
#[derive(Parser, Debug)]
#[command(name = "lmexport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "LMEXPORT_FORMAT",
        default_value = "table",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override settings file location
    #[arg(long, global = true, env = "LMEXPORT_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Env file with ACCESS_ID, ACCESS_KEY and COMPANY
    #[arg(long, global = true, env = "LMEXPORT_ENV_FILE", hide_env = true)]
    pub env_file: Option<PathBuf>,

    /// Override the API host (scheme and host, e.g. http://localhost:8080)
    #[arg(long, global = true, env = "LMEXPORT_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "LMEXPORT_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export LogicModule categories to JSON files
    Export(ExportArgs),

    /// List exportable categories and their API resource paths
    Categories,

    /// Show credential and configuration status
    Status,
}
