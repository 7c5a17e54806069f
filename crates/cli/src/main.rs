//! RadImpress CLI: the main entry point.
//!
//! Commands:
//! - `serve`  : Start the web UI and JSON API
//! - `onboard`: Create config, data directory and studies file
//! - `doctor` : Diagnose configuration and stored study data
//! - `studies`: List study types with prompt/document indicators
//! - `extract`: Print the text extracted from a `.docx`

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "radimpress",
    about = "RadImpress: radiology impression generator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI and JSON API
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize configuration and the data directory
    Onboard,

    /// Diagnose configuration and study data
    Doctor,

    /// List study types and their configuration
    Studies,

    /// Extract the text of a reference document
    Extract {
        /// Path to a .docx file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Studies => commands::studies::run().await?,
        Commands::Extract { file } => commands::extract::run(&file).await?,
    }

    Ok(())
}
