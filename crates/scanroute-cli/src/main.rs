//! Command-line front end for the scanned document router.

mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{batch, config, process, serve};

/// Route scanned documents into folders by the name and account number on them
#[derive(Parser)]
#[command(name = "scanroute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the scan folder and serve the HTTP API
    Serve(serve::ServeArgs),

    /// Extract and classify a single document
    Process(process::ProcessArgs),

    /// Route every document in the scan folder (or matching a glob)
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve(args) => {
            let cfg = config::load(config_path)?;
            std::fs::create_dir_all(&cfg.paths.log_dir)?;
            logging::init(cli.verbose, &cfg.log.level, Some(&cfg.paths.log_dir));
            serve::run(args, cfg).await
        }
        Commands::Process(args) => {
            let cfg = config::load(config_path)?;
            logging::init(cli.verbose, &cfg.log.level, None);
            process::run(args, cfg).await
        }
        Commands::Batch(args) => {
            let cfg = config::load(config_path)?;
            logging::init(cli.verbose, &cfg.log.level, None);
            batch::run(args, cfg).await
        }
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
