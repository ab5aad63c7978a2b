//! `once` command - one poll cycle, snapshot printed to stdout.

use std::path::Path;

use buswatch::app::{AppConfig, BusWatchApp};

use super::common::{build_runtime, init_logging, load_config};
use crate::error::CliError;

pub fn run(config_path: Option<&Path>, verbose: bool) -> Result<(), CliError> {
    let config_file = load_config(config_path)?;
    let config = AppConfig::from_config_file(&config_file);

    let _logging = init_logging(verbose, &config_file)?;
    let runtime = build_runtime()?;

    let snapshot = runtime.block_on(BusWatchApp::poll_once(&config))?;
    let json = snapshot.to_json()?;

    println!("{}", String::from_utf8_lossy(&json));
    Ok(())
}
