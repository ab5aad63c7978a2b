//! Application configuration for BusWatchApp.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::model::BoardLine;
use crate::scraper::ScraperConfig;
use crate::scheduler::SchedulerConfig;
use crate::watcher::WatcherConfig;

use super::AppError;

/// Which loops to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Scheduler and watcher.
    Run,
    /// Scheduler only.
    Poll,
    /// Watcher only.
    Watch,
}

impl AppMode {
    pub fn runs_scheduler(self) -> bool {
        matches!(self, AppMode::Run | AppMode::Poll)
    }

    pub fn runs_watcher(self) -> bool {
        matches!(self, AppMode::Run | AppMode::Watch)
    }
}

/// Everything needed to start the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Lines to poll, in output order.
    pub lines: Vec<BoardLine>,

    /// Stop registry JSON file.
    pub stop_registry: PathBuf,

    /// Snapshot file written by the scheduler and read by the watcher.
    pub snapshot: PathBuf,

    /// WebDriver endpoint.
    pub webdriver_url: String,

    pub scraper: ScraperConfig,

    pub poll_interval: Duration,

    /// `None` when no target stop is configured.
    pub watch: Option<WatcherConfig>,
}

impl AppConfig {
    /// Create application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let scraper = ScraperConfig::default()
            .with_url_template(config.board.url_template.clone())
            .with_render_timeout(Duration::from_secs(config.scraper.render_timeout_secs))
            .with_settle_delay(Duration::from_millis(config.scraper.settle_delay_ms));

        let watch = config.watch.target_stop.as_ref().map(|target| {
            WatcherConfig::new(target.clone())
                .with_channel(config.watch.channel.clone())
                .with_message_template(config.watch.message.clone())
                .with_interval(Duration::from_millis(config.watch.interval_ms))
        });

        Self {
            lines: config.lines.clone(),
            stop_registry: config.files.stop_registry.clone(),
            snapshot: config.files.snapshot.clone(),
            webdriver_url: config.scraper.webdriver_url.clone(),
            scraper,
            poll_interval: Duration::from_secs(config.poll.interval_secs),
            watch,
        }
    }

    pub fn with_lines(mut self, lines: Vec<BoardLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_watch(mut self, watch: WatcherConfig) -> Self {
        self.watch = Some(watch);
        self
    }

    /// Scheduler settings.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.lines.clone()).with_interval(self.poll_interval)
    }

    /// Check that everything `mode` needs is present.
    pub fn validate(&self, mode: AppMode) -> Result<(), AppError> {
        if mode.runs_scheduler() {
            if self.lines.is_empty() {
                return Err(AppError::Config(
                    "no lines configured; add entries to the [lines] section".to_string(),
                ));
            }
            if !self.scraper.url_template.contains("{course_id}") {
                return Err(AppError::Config(
                    "board.url_template must contain {course_id}".to_string(),
                ));
            }
        }

        if mode.runs_watcher() && self.watch.is_none() {
            return Err(AppError::Config("watch.target_stop is not set".to_string()));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DEFAULT_POLL_INTERVAL;

    #[test]
    fn test_from_default_config_file() {
        let config = AppConfig::default();
        assert!(config.lines.is_empty());
        assert!(config.watch.is_none());
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.snapshot, PathBuf::from("bus_location.json"));
    }

    #[test]
    fn test_from_config_file_carries_settings() {
        let file = ConfigFile::parse(
            "[lines]\nL1 = 1\n[scraper]\nsettle_delay_ms = 500\n\
             [watch]\ntarget_stop = 駅前\ninterval_ms = 250\nmessage = {line}!\n",
        )
        .unwrap();
        let config = AppConfig::from_config_file(&file);

        assert_eq!(config.lines, vec![BoardLine::new("L1", "1")]);
        assert_eq!(config.scraper.settle_delay, Duration::from_millis(500));
        let watch = config.watch.unwrap();
        assert_eq!(watch.target_stop, "駅前");
        assert_eq!(watch.interval, Duration::from_millis(250));
        assert_eq!(watch.format_message("L1"), "L1!");
    }

    #[test]
    fn test_validate_by_mode() {
        let empty = AppConfig::default();
        assert!(matches!(empty.validate(AppMode::Poll), Err(AppError::Config(_))));
        assert!(matches!(empty.validate(AppMode::Watch), Err(AppError::Config(_))));

        let poll_only = AppConfig::default().with_lines(vec![BoardLine::new("L1", "1")]);
        assert!(poll_only.validate(AppMode::Poll).is_ok());
        assert!(poll_only.validate(AppMode::Run).is_err());

        let full = poll_only.with_watch(WatcherConfig::new("A"));
        assert!(full.validate(AppMode::Run).is_ok());
        assert!(full.validate(AppMode::Watch).is_ok());
    }

    #[test]
    fn test_url_template_needs_placeholder() {
        let mut config = AppConfig::default().with_lines(vec![BoardLine::new("L1", "1")]);
        config.scraper.url_template = "https://example.com/board".to_string();
        assert!(config.validate(AppMode::Poll).is_err());
    }

    #[test]
    fn test_mode_flags() {
        assert!(AppMode::Run.runs_scheduler() && AppMode::Run.runs_watcher());
        assert!(AppMode::Poll.runs_scheduler() && !AppMode::Poll.runs_watcher());
        assert!(!AppMode::Watch.runs_scheduler() && AppMode::Watch.runs_watcher());
    }
}
