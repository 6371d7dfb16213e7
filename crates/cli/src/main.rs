//! TaskScout CLI, the main entry point.
//!
//! Commands:
//! - `run`      Plan an objective and work through its tasks
//! - `onboard`  Write a default config file
//! - `doctor`   Diagnose configuration and credentials

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskscout",
    about = "TaskScout: breaks an objective into tasks and researches each one",
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
    /// Plan and execute an objective
    Run {
        /// The objective; asked for on stdin when omitted
        #[arg(short, long)]
        objective: Option<String>,

        /// How web pages become context: `rank` or `summarize`
        #[arg(short, long)]
        mode: Option<String>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize configuration
    Onboard,

    /// Diagnose configuration and credentials
    Doctor,
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
        Commands::Run {
            objective,
            mode,
            json,
        } => commands::run::run(objective, mode, json).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
