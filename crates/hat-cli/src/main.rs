use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hat_cli::commands::run::RunOptions;
use hat_cli::commands::{clean, run, week};
use hat_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout();
    match &cli.command {
        Some(Commands::Run {
            date,
            dry_run,
            seed,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let options = RunOptions {
                date: *date,
                dry_run: *dry_run,
                seed: *seed,
            };
            run::run(&mut stdout, &config, options).await?;
        }
        Some(Commands::Clean { date, dry_run }) => {
            let config = load_config(cli.config.as_deref())?;
            clean::run(&mut stdout, &config, *date, *dry_run).await?;
        }
        Some(Commands::Week { date }) => {
            let config = load_config(cli.config.as_deref())?;
            week::run(&mut stdout, &config, *date)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
