//! Scenario Dedup CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use scenario_dedup::cli::commands::{analyze, compare, config, dedup};
use scenario_dedup::cli::{handle_error, Cli, Commands};
use scenario_dedup::infrastructure::logging::LoggerImpl;
use scenario_dedup::{Config, ConfigLoader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // `config validate` reports load failures itself, so it starts from defaults.
    let mut loaded = match cli.command {
        Commands::Config(_) => Config::default(),
        _ => ConfigLoader::load_with(cli.config.as_deref()).context("Failed to load configuration")?,
    };
    if let Some(level) = &cli.log_level {
        loaded.logging.level = level.to_lowercase();
    }

    let _logger = LoggerImpl::init(&loaded.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Dedup(args) => dedup::execute(args, &loaded, cli.json).await,
        Commands::Analyze(args) => analyze::execute(args, &loaded, cli.json).await,
        Commands::Compare(args) => compare::execute(args, cli.json).await,
        Commands::Config(args) => config::execute(args, cli.config.as_deref(), cli.json),
    }
}
