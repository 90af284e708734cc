//! Skylens CLI - Crisis-map and drone imagery analysis.
//!
//! Skylens sends an image to one of several interchangeable vision-language
//! backends and validates the structured result against a category schema.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a crisis map with a randomly selected available backend
//! skylens analyze map.png
//!
//! # Analyze drone imagery with a specific backend
//! skylens analyze frame.jpg --category drone_image --model anthropic
//!
//! # List registered backends
//! skylens providers
//!
//! # View configuration
//! skylens config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Skylens - crisis-map and drone imagery analysis.
#[derive(Parser, Debug)]
#[command(name = "skylens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze an image and validate the structured result
    Analyze(cli::analyze::AnalyzeArgs),

    /// List registered analysis providers
    Providers(cli::providers::ProvidersArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match skylens_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `skylens config path`."
            );
            skylens_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Skylens v{}", skylens_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Providers(args) => cli::providers::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
