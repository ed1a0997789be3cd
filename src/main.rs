use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
#[cfg(feature = "telegram")]
use std::sync::Arc;

use filebot::bot::BotServer;
use filebot::config::Config;

#[derive(Parser)]
#[command(name = "filebot")]
#[command(about = "A single-owner chat bot for storing and managing photos and documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and poll for updates
    Start,
    /// Write a default configuration file
    Init,
    /// Validate the configuration and print the resolved storage areas
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verbosity flags win over the configured level; RUST_LOG wins over both
    let log_level = match cli.verbose {
        0 => configured_level(&cli.config),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting filebot v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            let server = BotServer::new(config).await?;
            run(server).await?;
        }
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Check => {
            let config = Config::load(&cli.config).await?;
            let server = BotServer::new(config).await?;
            server.show_status().await?;
        }
    }

    Ok(())
}

#[cfg(feature = "telegram")]
async fn run(server: BotServer) -> Result<()> {
    filebot::telegram::run(Arc::new(server)).await
}

#[cfg(not(feature = "telegram"))]
async fn run(_server: BotServer) -> Result<()> {
    anyhow::bail!("filebot was built without the 'telegram' feature; no transport available")
}

/// Log level from the config file, read before logging is up.
fn configured_level(path: &str) -> String {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str::<Config>(&content).ok())
        .map(|config| config.logging.level)
        .unwrap_or_else(|| "info".to_string())
}
