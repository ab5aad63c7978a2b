//! Init command - write a default configuration file.

use std::path::Path;

use buswatch::config::ConfigFile;

use super::common::resolve_config_path;
use crate::error::CliError;

pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);

    if path.exists() {
        println!("Configuration file already exists: {}", path.display());
        println!("Remove it first to regenerate defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add one `name = course_id` entry per line under [lines]");
    println!("  2. Set target_stop (and channel) under [watch]");
    println!("  3. Export DISCORD_BOT_TOKEN before running `buswatch run`");
    Ok(())
}
