//! Long-running commands: `run`, `poll` and `watch`.

use std::path::Path;

use buswatch::app::{credential_from_env, AppConfig, AppError, AppMode, BusWatchApp};

use super::common::{build_runtime, init_logging, load_config, resolve_config_path};
use crate::error::CliError;

/// Start the loops for `mode` and block until Ctrl+C.
pub fn run(mode: AppMode, config_path: Option<&Path>, verbose: bool) -> Result<(), CliError> {
    let config_file = load_config(config_path)?;
    let config = AppConfig::from_config_file(&config_file);
    config.validate(mode)?;

    let credential = if mode.runs_watcher() {
        Some(credential_from_env().ok_or(AppError::MissingCredential)?)
    } else {
        None
    };

    let _logging = init_logging(verbose, &config_file)?;
    print_banner(mode, config_path, &config);

    let runtime = build_runtime()?;
    runtime.block_on(async {
        let app = BusWatchApp::start(config, mode, credential).await?;

        let shutdown = app.shutdown_token();
        ctrlc::set_handler(move || {
            println!();
            println!("Received shutdown signal, stopping...");
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        app.wait().await;
        Ok::<(), CliError>(())
    })?;

    println!("Stopped.");
    Ok(())
}

fn print_banner(mode: AppMode, config_path: Option<&Path>, config: &AppConfig) {
    println!("buswatch v{}", buswatch::VERSION);
    println!("================");
    println!();
    println!("Config:   {}", resolve_config_path(config_path).display());
    println!("Snapshot: {}", config.snapshot.display());

    if mode.runs_scheduler() {
        let names: Vec<_> = config.lines.iter().map(|l| l.name.as_str()).collect();
        println!("Lines:    {}", names.join(", "));
        println!(
            "Poll:     every {}s via {}",
            config.poll_interval.as_secs(),
            config.webdriver_url
        );
    }
    if let (true, Some(watch)) = (mode.runs_watcher(), &config.watch) {
        println!(
            "Watch:    {} -> #{} every {}ms",
            watch.target_stop,
            watch.channel,
            watch.interval.as_millis()
        );
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();
}
