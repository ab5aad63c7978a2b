//! buswatch CLI - poll bus operation boards and announce arrivals.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use buswatch::app::AppMode;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "buswatch", version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.buswatch/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll the boards and watch for arrivals until Ctrl+C
    Run,

    /// Poll the boards and write snapshots only
    Poll,

    /// Watch the snapshot and send notifications only
    Watch,

    /// Run a single poll cycle and print the snapshot
    Once,

    /// Write a default configuration file
    Init,

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run => commands::run::run(AppMode::Run, config_path, cli.verbose),
        Commands::Poll => commands::run::run(AppMode::Poll, config_path, cli.verbose),
        Commands::Watch => commands::run::run(AppMode::Watch, config_path, cli.verbose),
        Commands::Once => commands::once::run(config_path, cli.verbose),
        Commands::Init => commands::init::run(config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}
