//! Line scraper configuration.

use std::time::Duration;

use crate::model::BoardLine;

/// Operation board URL; `{course_id}` is replaced per line.
pub const DEFAULT_BOARD_URL_TEMPLATE: &str =
    "https://transfer.navitime.biz/keiseibus/pc/location/BusOperationResult?courseId={course_id}";

/// How long to wait for the bus area to render.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after scrolling so lazily rendered markers are laid out.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Configuration for [`LineScraper`](super::LineScraper).
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Board URL template containing a `{course_id}` placeholder.
    pub url_template: String,

    /// Maximum wait for the primary marker container.
    pub render_timeout: Duration,

    /// Delay after scrolling to the bottom of the board.
    pub settle_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_BOARD_URL_TEMPLATE.to_string(),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl ScraperConfig {
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// The board URL for a line.
    pub fn board_url(&self, line: &BoardLine) -> String {
        self.url_template.replace("{course_id}", &line.course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.render_timeout, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_board_url_substitutes_course_id() {
        let config = ScraperConfig::default();
        let url = config.board_url(&BoardLine::new("系統01", "0000123"));
        assert!(url.ends_with("courseId=0000123"));
    }

    #[test]
    fn test_custom_template() {
        let config = ScraperConfig::default().with_url_template("http://board/{course_id}/view");
        assert_eq!(
            config.board_url(&BoardLine::new("L1", "42")),
            "http://board/42/view"
        );
    }
}
