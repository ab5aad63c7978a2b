//! Application bootstrap implementation.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::{AppConfig, AppMode};
use super::error::AppError;
use crate::browser::WebDriverBrowser;
use crate::model::BoardLine;
use crate::notify::{DiscordNotifier, Notifier};
use crate::registry::StopRegistry;
use crate::scheduler::PollScheduler;
use crate::scraper::{LineScraper, LineSource};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::watcher::{ChangeWatcher, SnapshotSource};

/// Load the stop registry. Failure here is fatal for anything that polls.
pub fn load_registry(path: &Path) -> Result<Arc<StopRegistry>, AppError> {
    let registry = StopRegistry::load(path)?;
    Ok(Arc::new(registry))
}

/// Names of configured lines with no stop in the registry.
///
/// Buses on these lines can never be matched to a stop.
pub fn unregistered_lines(registry: &StopRegistry, lines: &[BoardLine]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !registry.has_line(&line.name))
        .map(|line| line.name.clone())
        .collect()
}

/// Wire a scheduler for `config` around any line source.
pub fn build_scheduler<S: LineSource>(
    source: S,
    registry: Arc<StopRegistry>,
    config: &AppConfig,
) -> PollScheduler<S> {
    for line in unregistered_lines(&registry, &config.lines) {
        warn!(line = %line, "Line has no stops in the registry; its buses cannot be matched");
    }

    PollScheduler::new(
        source,
        registry,
        SnapshotStore::new(&config.snapshot),
        config.scheduler_config(),
    )
}

/// Wire a watcher on the configured snapshot file around any notifier.
pub fn build_watcher<N: Notifier>(
    notifier: N,
    config: &AppConfig,
) -> Result<ChangeWatcher<SnapshotStore, N>, AppError> {
    let watch = config
        .watch
        .clone()
        .ok_or_else(|| AppError::Config("watch.target_stop is not set".to_string()))?;
    Ok(ChangeWatcher::new(
        SnapshotStore::new(&config.snapshot),
        notifier,
        watch,
    ))
}

/// Running scheduler and/or watcher sharing one shutdown token.
pub struct BusWatchApp {
    shutdown: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl BusWatchApp {
    /// An app with nothing running yet.
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Start the loops `mode` asks for with the production adapters.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Configuration problems, a missing credential (when the watcher runs),
    /// and an unloadable stop registry (when the scheduler runs) are all
    /// reported before anything is spawned.
    pub async fn start(
        config: AppConfig,
        mode: AppMode,
        credential: Option<String>,
    ) -> Result<Self, AppError> {
        config.validate(mode)?;

        let notifier = if mode.runs_watcher() {
            let token = credential.ok_or(AppError::MissingCredential)?;
            Some(DiscordNotifier::new(token).map_err(AppError::Notifier)?)
        } else {
            None
        };

        let scraper = if mode.runs_scheduler() {
            let registry = load_registry(&config.stop_registry)?;
            let browser = WebDriverBrowser::new(config.webdriver_url.clone())
                .map_err(AppError::Browser)?;
            Some((LineScraper::new(browser, config.scraper.clone()), registry))
        } else {
            None
        };

        info!(?mode, snapshot = %config.snapshot.display(), "Starting buswatch");

        let mut app = Self::new();
        if let Some((scraper, registry)) = scraper {
            app.spawn_scheduler(build_scheduler(scraper, registry, &config));
        }
        if let Some(notifier) = notifier {
            app.spawn_watcher(build_watcher(notifier, &config)?);
        }
        Ok(app)
    }

    /// Run exactly one poll cycle and return the persisted snapshot.
    pub async fn poll_once(config: &AppConfig) -> Result<Snapshot, AppError> {
        config.validate(AppMode::Poll)?;
        let registry = load_registry(&config.stop_registry)?;
        let browser =
            WebDriverBrowser::new(config.webdriver_url.clone()).map_err(AppError::Browser)?;
        let scraper = LineScraper::new(browser, config.scraper.clone());

        let mut scheduler = build_scheduler(scraper, registry, config);
        Ok(scheduler.run_cycle().await?)
    }

    /// Spawn a scheduler bound to this app's shutdown token.
    pub fn spawn_scheduler<S: LineSource>(&mut self, scheduler: PollScheduler<S>) {
        let handle = tokio::spawn(scheduler.run(self.shutdown.clone()));
        self.tasks.push(("scheduler", handle));
    }

    /// Spawn a watcher bound to this app's shutdown token.
    pub fn spawn_watcher<S, N>(&mut self, watcher: ChangeWatcher<S, N>)
    where
        S: SnapshotSource + 'static,
        N: Notifier + 'static,
    {
        let handle = tokio::spawn(watcher.run(self.shutdown.clone()));
        self.tasks.push(("watcher", handle));
    }

    /// Token that stops every loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of running loops.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every loop to finish.
    pub async fn wait(self) {
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "Task ended abnormally");
            }
        }
        info!("buswatch stopped");
    }

    /// Cancel every loop and wait for them to finish.
    pub async fn shutdown(self) {
        info!("Shutting down buswatch");
        self.shutdown.cancel();
        self.wait().await;
    }
}

impl Default for BusWatchApp {
    fn default() -> Self {
        Self::new()
    }
}
