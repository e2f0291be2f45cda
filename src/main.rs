//! Overlord CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use overlord::cli::{Cli, Commands};
use overlord::infrastructure::logging::LoggerImpl;
use overlord::{Config, ConfigLoader};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .context("Failed to load configuration")
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Simulate {
            scenario,
            cycles,
            store,
            decisions_only,
        } => {
            overlord::cli::commands::simulate::execute(&scenario, cycles, store, decisions_only, &config, cli.json)
                .await
        }
        Commands::Catalog => overlord::cli::commands::catalog::execute(cli.json),
        Commands::Inspect { zone } => overlord::cli::commands::zone::inspect(&zone, &config, cli.json).await,
        Commands::Reset { zone } => overlord::cli::commands::zone::reset(&zone, &config, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        overlord::cli::handle_error(err, json);
    }
}
