use std::time::Duration;

use crate::model::BoardLine;

/// Pause between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for [`PollScheduler`](super::PollScheduler).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Lines to scrape each cycle, in snapshot order.
    pub lines: Vec<BoardLine>,

    /// Sleep after each persisted snapshot.
    pub interval: Duration,
}

impl SchedulerConfig {
    pub fn new(lines: Vec<BoardLine>) -> Self {
        Self {
            lines,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
