use std::time::Duration;

/// Default tick interval.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Default notification text. `{line}` is replaced by the line name.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{line} のバスがもうそろそろ到着するよ！！";

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "通知チャンネル";

/// Change watcher settings.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Stop whose arrivals trigger a notification.
    pub target_stop: String,
    /// Channel that receives the notification.
    pub channel: String,
    /// Message text with a `{line}` placeholder.
    pub message_template: String,
    /// Tick interval (default: 1s).
    pub interval: Duration,
}

impl WatcherConfig {
    pub fn new(target_stop: impl Into<String>) -> Self {
        Self {
            target_stop: target_stop.into(),
            channel: DEFAULT_CHANNEL.to_string(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Render the notification for a bus on `line`.
    pub fn format_message(&self, line: &str) -> String {
        self.message_template.replace("{line}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatcherConfig::new("駅前");
        assert_eq!(config.target_stop, "駅前");
        assert_eq!(config.channel, DEFAULT_CHANNEL);
        assert_eq!(config.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_format_message() {
        let config = WatcherConfig::new("駅前");
        assert_eq!(
            config.format_message("系統01"),
            "系統01 のバスがもうそろそろ到着するよ！！"
        );

        let custom = config.with_message_template("Bus on {line} ({line})");
        assert_eq!(custom.format_message("L1"), "Bus on L1 (L1)");
    }

    #[test]
    fn test_template_without_placeholder() {
        let config = WatcherConfig::new("A").with_message_template("Bus!");
        assert_eq!(config.format_message("L1"), "Bus!");
    }
}
