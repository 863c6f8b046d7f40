//! Gridworld CLI - tabular Q-learning on grid layouts
//!
//! This CLI provides:
//! - Training a Q-learning agent and printing its Q-values, policy and state values
//! - Inspecting built-in and file-based layouts

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "gridworld")]
#[command(version, about = "Tabular Q-learning on grid worlds", long_about = None)]
struct Cli {
    /// Log training progress (`RUST_LOG` overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning agent
    Train(Box<gridworld::cli::commands::train::TrainArgs>),

    /// Print a layout and its statistics
    Show(gridworld::cli::commands::show::ShowArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "gridworld=info" } else { "gridworld=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Train(args) => gridworld::cli::commands::train::execute(*args),
        Commands::Show(args) => gridworld::cli::commands::show::execute(args),
    }
}
