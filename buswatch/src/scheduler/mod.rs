//! Poll scheduler: scrape every line, match, persist, sleep, repeat.
//!
//! # Cycle
//!
//! ```text
//! Scraping ──► Aggregating ──► Persisting ──► Sleeping ──┐
//!    ▲   (one task per line)                 (interval)  │
//!    └───────────────────────────────────────────────────┘
//! ```
//!
//! The sleep is measured from the end of persistence, so the real period is
//! `interval + scrape time`. Cancellation is observed between cycles; an
//! in-flight scrape always finishes so its browser session gets closed.

mod config;

pub use config::{SchedulerConfig, DEFAULT_POLL_INTERVAL};

use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::matcher::match_positions;
use crate::model::LineObservations;
use crate::registry::StopRegistry;
use crate::scraper::LineSource;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};

/// Wall-clock source for snapshot timestamps.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Local wall-clock time.
pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().naive_local())
}

/// Drives the scrape → match → persist loop.
pub struct PollScheduler<S: LineSource> {
    source: Arc<S>,
    registry: Arc<StopRegistry>,
    store: SnapshotStore,
    config: SchedulerConfig,
    clock: Clock,
    last_captured_at: Option<NaiveDateTime>,
}

impl<S: LineSource> PollScheduler<S> {
    /// Creates a scheduler.
    ///
    /// # Arguments
    ///
    /// * `source` - Per-line scraper
    /// * `registry` - Stop registry shared read-only with every cycle
    /// * `store` - Snapshot destination
    /// * `config` - Lines and poll interval
    pub fn new(
        source: S,
        registry: Arc<StopRegistry>,
        store: SnapshotStore,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            source: Arc::new(source),
            registry,
            store,
            config,
            clock: local_clock(),
            last_captured_at: None,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Runs cycles until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            lines = self.config.lines.len(),
            interval_secs = self.config.interval.as_secs(),
            snapshot = %self.store.path().display(),
            "Poll scheduler starting"
        );

        while !shutdown.is_cancelled() {
            match self.run_cycle().await {
                Ok(snapshot) => info!(
                    captured_at = %snapshot.captured_at_string(),
                    positions = snapshot.positions.len(),
                    next_in_secs = self.config.interval.as_secs(),
                    "Snapshot persisted"
                ),
                Err(e) => error!(error = %e, "Snapshot not persisted; data for this cycle is lost"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("Poll scheduler stopped");
    }

    /// Runs exactly one cycle and returns the snapshot that was persisted.
    ///
    /// Only a persistence failure is an error; scrape problems show up as
    /// missing positions.
    pub async fn run_cycle(&mut self) -> Result<Snapshot, SnapshotError> {
        debug!(lines = self.config.lines.len(), "Starting poll cycle");

        let observations = self.scrape_all().await;

        let positions = observations
            .iter()
            .flat_map(|obs| match_positions(obs, &self.registry))
            .collect();

        let snapshot = Snapshot::new(self.next_timestamp(), positions);
        debug!(positions = ?snapshot.positions, "Current bus positions");

        self.store.save(&snapshot).await?;
        Ok(snapshot)
    }

    /// Scrape every configured line concurrently, one task per line.
    ///
    /// Results come back in configured line order. A task that panics
    /// contributes empty observations for its line.
    async fn scrape_all(&self) -> Vec<LineObservations> {
        let handles: Vec<_> = self
            .config
            .lines
            .iter()
            .cloned()
            .map(|line| {
                let source = Arc::clone(&self.source);
                tokio::spawn(async move { source.observe(&line).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.config.lines)
            .map(|(result, line)| {
                result.unwrap_or_else(|e| {
                    warn!(line = %line.name, error = %e, "Scrape task failed");
                    LineObservations::empty(&line.name)
                })
            })
            .collect()
    }

    /// Aggregation timestamp, never earlier than the previous one.
    fn next_timestamp(&mut self) -> NaiveDateTime {
        let now = (self.clock)();
        let captured_at = match self.last_captured_at {
            Some(last) if now < last => {
                warn!(%now, %last, "Wall clock moved backwards; reusing previous timestamp");
                last
            }
            _ => now,
        };
        self.last_captured_at = Some(captured_at);
        captured_at
    }
}
