//! lmexport - Export LogicMonitor LogicModules to local JSON files

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod export;
mod models;
mod output;

use cli::{Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Warnings by default (`RUST_LOG` respected); `--debug` turns on our debug logs.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("lmexport", log::LevelFilter::Debug);
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Export(ref args) => cli::export::run(&opts, args).await,
        Commands::Categories => cli::categories::run(opts.format),
        Commands::Status => cli::status::run(&opts),
    }
}
