//! LAID CLI: the main entry point.
//!
//! Commands:
//! - `chat`     Interactive chat or single-message mode (default)
//! - `models`   List the model catalog or the server's models
//! - `modes`    List the available modes
//! - `config`   Create, show or locate the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use laid_config::AppConfig;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(
    name = "laid",
    about = "LAID: local AI-assisted development agent for LM Studio",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.laid/config.toml
    #[arg(long, global = true, env = "LAID_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List models
    Models {
        /// Ask the server which models it has instead of reading the catalog
        #[arg(long)]
        remote: bool,
    },

    /// List the available modes
    Modes,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so streamed answers on stdout stay clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);

    match cli.command.unwrap_or(Commands::Chat { message: None }) {
        Commands::Chat { message } => commands::chat::run(&config_path, message).await?,
        Commands::Models { remote } => commands::models::run(&config_path, remote).await?,
        Commands::Modes => commands::modes::run(&config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_cmd::init(&config_path, force).await?,
            ConfigAction::Show => commands::config_cmd::show(&config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(&config_path).await?,
        },
    }

    Ok(())
}
