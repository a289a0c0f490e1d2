use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod agent;
mod card;
mod cli;
mod commands;
mod config;
mod llm;
mod pipeline;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(log_level: &LogLevel, verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taleforge")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taleforge.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // --verbose wins, then RUST_LOG, then the config log_level
    let mut builder = env_logger::Builder::new();

    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if std::env::var("RUST_LOG").is_ok() {
        // Let env_logger parse RUST_LOG
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run(cli: Cli, config: Config, api_key: Option<String>) -> Result<()> {
    match cli.command {
        Commands::Story { scenario, local } => {
            commands::story::run(scenario.as_deref(), local, cli.quiet, api_key.as_deref(), &config)
        }
        Commands::Card {
            description,
            local,
            output_dir,
            format,
        } => commands::card::run(
            description.as_deref(),
            local,
            cli.quiet,
            format,
            output_dir.as_deref(),
            api_key.as_deref(),
            &config,
        ),
        Commands::Doctor => commands::doctor::run(api_key.as_deref(), &config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with log level from config (or RUST_LOG env var)
    setup_logging(&config.log_level, cli.verbose).context("Failed to setup logging")?;

    info!("Starting taleforge with config from: {:?}", cli.config);

    // Credentials are read exactly once, here. They travel as an explicit
    // value; nothing downstream touches the process environment.
    let api_key = std::env::var("OPENROUTER_API_KEY").ok();

    // Run the command
    run(cli, config, api_key).context("Command failed")?;

    Ok(())
}
