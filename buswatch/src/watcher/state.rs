use std::time::SystemTime;

/// Last snapshot modification marker the watcher has acted on.
///
/// Starts empty, so the first readable snapshot always counts as new.
/// Also remembers the marker of a snapshot that failed to load, so a file
/// stuck in a bad state is reported once rather than on every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherState {
    last_observed: Option<SystemTime>,
    failed: Option<SystemTime>,
}

impl WatcherState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_observed(&self) -> Option<SystemTime> {
        self.last_observed
    }

    /// Whether `marker` is strictly newer than the last committed one.
    pub fn is_newer(&self, marker: SystemTime) -> bool {
        self.last_observed.map_or(true, |last| marker > last)
    }

    /// Record `marker` as handled.
    pub fn commit(&mut self, marker: SystemTime) {
        self.last_observed = Some(marker);
        self.failed = None;
    }

    pub fn failed_marker(&self) -> Option<SystemTime> {
        self.failed
    }

    /// Record that the snapshot at `marker` could not be loaded.
    ///
    /// Returns `true` the first time a given marker fails.
    pub fn record_failure(&mut self, marker: SystemTime) -> bool {
        let first = self.failed != Some(marker);
        self.failed = Some(marker);
        first
    }
}
