//! Change watcher: notify when a bus reaches the target stop.
//!
//! # State Machine
//!
//! ```text
//! Idle --[tick]--> CheckModification
//! CheckModification --[marker not newer / unreadable]--> Idle
//! CheckModification --[marker newer]--> LoadSnapshot
//! LoadSnapshot --[read/parse error]--> Idle (marker kept, retried next tick;
//!                                             warned once per marker)
//! LoadSnapshot --[ok]--> ScanForTarget (marker committed)
//! ScanForTarget --[first position at target]--> Notify --> Idle
//! ScanForTarget --[none]--> Idle
//! ```
//!
//! Deduplication is by modification time only: a bus that sits at the
//! target stop across several poll cycles is announced once per cycle.

mod config;
mod state;

pub use config::{
    WatcherConfig, DEFAULT_CHANNEL, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_WATCH_INTERVAL,
};
pub use state::WatcherState;

use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::notify::Notifier;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Read access to the shared snapshot.
pub trait SnapshotSource: Send + Sync {
    /// Current modification marker.
    fn modified(&self) -> BoxFuture<'_, Result<SystemTime, SnapshotError>>;

    /// Current snapshot contents.
    fn load(&self) -> BoxFuture<'_, Result<Snapshot, SnapshotError>>;
}

impl SnapshotSource for SnapshotStore {
    fn modified(&self) -> BoxFuture<'_, Result<SystemTime, SnapshotError>> {
        Box::pin(SnapshotStore::modified(self))
    }

    fn load(&self) -> BoxFuture<'_, Result<Snapshot, SnapshotError>> {
        Box::pin(SnapshotStore::load(self))
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Marker not newer than the last handled one.
    Unchanged,
    /// Marker or snapshot could not be read.
    Unreadable,
    /// New snapshot, but no bus at the target stop.
    NoMatch,
    /// Notification delivered for a bus on `line`.
    Notified { line: String },
    /// A bus on `line` matched but delivery failed.
    DeliveryFailed { line: String },
}

/// Polls the snapshot and notifies on arrivals at the target stop.
pub struct ChangeWatcher<S, N> {
    source: S,
    notifier: N,
    config: WatcherConfig,
    state: WatcherState,
}

impl<S: SnapshotSource, N: Notifier> ChangeWatcher<S, N> {
    pub fn new(source: S, notifier: N, config: WatcherConfig) -> Self {
        Self {
            source,
            notifier,
            config,
            state: WatcherState::new(),
        }
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Ticks until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            target_stop = %self.config.target_stop,
            channel = %self.config.channel,
            interval_ms = self.config.interval.as_millis() as u64,
            "Change watcher starting"
        );

        let mut ticker = tokio::time::interval(self.config.interval.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Change watcher stopped");
    }

    /// One pass of the state machine.
    pub async fn tick(&mut self) -> TickOutcome {
        let marker = match self.source.modified().await {
            Ok(marker) => marker,
            Err(e) => {
                debug!(error = %e, "Snapshot marker unavailable");
                return TickOutcome::Unreadable;
            }
        };

        if !self.state.is_newer(marker) {
            return TickOutcome::Unchanged;
        }

        let snapshot = match self.source.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if self.state.record_failure(marker) {
                    warn!(error = %e, "Snapshot changed but could not be loaded; retrying");
                } else {
                    debug!(error = %e, "Snapshot still unreadable");
                }
                return TickOutcome::Unreadable;
            }
        };
        self.state.commit(marker);

        debug!(
            captured_at = %snapshot.captured_at_string(),
            positions = snapshot.positions.len(),
            "Snapshot update detected"
        );

        let Some(position) = snapshot.first_at_stop(&self.config.target_stop) else {
            return TickOutcome::NoMatch;
        };

        let line = position.line.clone();
        let message = self.config.format_message(&line);

        match self.notifier.send(&self.config.channel, &message).await {
            Ok(()) => {
                info!(line = %line, stop = %self.config.target_stop, "Arrival notification sent");
                TickOutcome::Notified { line }
            }
            Err(e) => {
                warn!(line = %line, error = %e, "Arrival notification failed");
                TickOutcome::DeliveryFailed { line }
            }
        }
    }
}
