//! Configuration CLI commands: `config path` and `config list`.

use std::path::Path;

use clap::Subcommand;

use super::common::{load_config, resolve_config_path};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List effective configuration settings
    List,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", resolve_config_path(config_path).display());
            Ok(())
        }
        ConfigCommands::List => run_list(config_path),
    }
}

fn run_list(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = String::new();

    for (section, key, value) in config.entries() {
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        if value.is_empty() {
            println!("  {} = (not set)", key);
        } else {
            println!("  {} = {}", key, value);
        }
    }

    if config.lines.is_empty() {
        println!();
        println!("[lines] has no entries; nothing will be polled.");
    }

    Ok(())
}
