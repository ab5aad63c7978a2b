//! INI configuration file.
//!
//! ```ini
//! [board]
//! url_template = https://example.com/board?courseId={course_id}
//!
//! [lines]
//! 系統01 = 1234567
//!
//! [files]
//! stop_registry = bus_stop.json
//! snapshot = bus_location.json
//!
//! [poll]
//! interval_secs = 60
//!
//! [scraper]
//! webdriver_url = http://localhost:9515
//! render_timeout_secs = 10
//! settle_delay_ms = 2000
//!
//! [watch]
//! target_stop = 駅前
//! channel = general
//! message = {line} のバスがもうそろそろ到着するよ！！
//! interval_ms = 1000
//!
//! [logging]
//! directory = /var/log/buswatch
//! ```
//!
//! Missing keys fall back to defaults; `[lines]` keeps file order.

mod error;

pub use error::ConfigError;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{EscapePolicy, Ini, ParseOption, WriteOption};

use crate::browser::DEFAULT_WEBDRIVER_URL;
use crate::model::BoardLine;
use crate::scraper::{DEFAULT_BOARD_URL_TEMPLATE, DEFAULT_RENDER_TIMEOUT, DEFAULT_SETTLE_DELAY};
use crate::scheduler::DEFAULT_POLL_INTERVAL;
use crate::watcher::{DEFAULT_CHANNEL, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_WATCH_INTERVAL};

/// Default stop registry file.
pub const DEFAULT_STOP_REGISTRY_FILE: &str = "bus_stop.json";

/// Default snapshot file.
pub const DEFAULT_SNAPSHOT_FILE: &str = "bus_location.json";

const CONFIG_DIR: &str = ".buswatch";
const CONFIG_FILE: &str = "config.ini";

/// `~/.buswatch/config.ini`, or a relative path if the home directory is unknown.
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSettings {
    pub url_template: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileSettings {
    pub stop_registry: PathBuf,
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScraperSettings {
    pub webdriver_url: String,
    pub render_timeout_secs: u64,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
    /// Unset means the watcher cannot run.
    pub target_stop: Option<String>,
    pub channel: String,
    pub message: String,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingSettings {
    /// Directory for the daily log file. Unset logs to stderr only.
    pub directory: Option<PathBuf>,
}

/// The parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub board: BoardSettings,
    /// Lines to poll, in file order.
    pub lines: Vec<BoardLine>,
    pub files: FileSettings,
    pub poll: PollSettings,
    pub scraper: ScraperSettings,
    pub watch: WatchSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            board: BoardSettings {
                url_template: DEFAULT_BOARD_URL_TEMPLATE.to_string(),
            },
            lines: Vec::new(),
            files: FileSettings {
                stop_registry: PathBuf::from(DEFAULT_STOP_REGISTRY_FILE),
                snapshot: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            },
            poll: PollSettings {
                interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            },
            scraper: ScraperSettings {
                webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
                render_timeout_secs: DEFAULT_RENDER_TIMEOUT.as_secs(),
                settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            },
            watch: WatchSettings {
                target_stop: None,
                channel: DEFAULT_CHANNEL.to_string(),
                message: DEFAULT_MESSAGE_TEMPLATE.to_string(),
                interval_ms: DEFAULT_WATCH_INTERVAL.as_millis() as u64,
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file is an error; use `unwrap_or_default`
    /// at the call site to fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_opt(content, parse_option())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("board")) {
            if let Some(v) = non_empty(section.get("url_template")) {
                config.board.url_template = v.to_string();
            }
        }

        if let Some(section) = ini.section(Some("lines")) {
            config.lines = section
                .iter()
                .map(|(name, course_id)| BoardLine::new(name.trim(), course_id.trim()))
                .collect();
        }

        if let Some(section) = ini.section(Some("files")) {
            if let Some(v) = non_empty(section.get("stop_registry")) {
                config.files.stop_registry = PathBuf::from(v);
            }
            if let Some(v) = non_empty(section.get("snapshot")) {
                config.files.snapshot = PathBuf::from(v);
            }
        }

        if let Some(section) = ini.section(Some("poll")) {
            if let Some(v) = non_empty(section.get("interval_secs")) {
                config.poll.interval_secs = parse_positive("poll", "interval_secs", v)?;
            }
        }

        if let Some(section) = ini.section(Some("scraper")) {
            if let Some(v) = non_empty(section.get("webdriver_url")) {
                config.scraper.webdriver_url = v.to_string();
            }
            if let Some(v) = non_empty(section.get("render_timeout_secs")) {
                config.scraper.render_timeout_secs =
                    parse_positive("scraper", "render_timeout_secs", v)?;
            }
            if let Some(v) = non_empty(section.get("settle_delay_ms")) {
                config.scraper.settle_delay_ms = parse_number("scraper", "settle_delay_ms", v)?;
            }
        }

        if let Some(section) = ini.section(Some("watch")) {
            config.watch.target_stop = non_empty(section.get("target_stop")).map(str::to_string);
            if let Some(v) = non_empty(section.get("channel")) {
                config.watch.channel = v.to_string();
            }
            if let Some(v) = non_empty(section.get("message")) {
                config.watch.message = v.to_string();
            }
            if let Some(v) = non_empty(section.get("interval_ms")) {
                config.watch.interval_ms = parse_positive("watch", "interval_ms", v)?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            config.logging.directory = non_empty(section.get("directory")).map(PathBuf::from);
        }

        Ok(config)
    }

    /// Serialize to INI text.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("board"))
            .set("url_template", self.board.url_template.as_str());

        // Creates the section even when there are no lines yet.
        ini.entry(Some("lines".to_string())).or_insert_with(Default::default);
        for line in &self.lines {
            ini.with_section(Some("lines"))
                .set(line.name.as_str(), line.course_id.as_str());
        }

        ini.with_section(Some("files"))
            .set("stop_registry", self.files.stop_registry.display().to_string())
            .set("snapshot", self.files.snapshot.display().to_string());

        ini.with_section(Some("poll"))
            .set("interval_secs", self.poll.interval_secs.to_string());

        ini.with_section(Some("scraper"))
            .set("webdriver_url", self.scraper.webdriver_url.as_str())
            .set("render_timeout_secs", self.scraper.render_timeout_secs.to_string())
            .set("settle_delay_ms", self.scraper.settle_delay_ms.to_string());

        ini.with_section(Some("watch"))
            .set("target_stop", self.watch.target_stop.clone().unwrap_or_default())
            .set("channel", self.watch.channel.as_str())
            .set("message", self.watch.message.as_str())
            .set("interval_ms", self.watch.interval_ms.to_string());

        ini.with_section(Some("logging")).set(
            "directory",
            self.logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        );

        ini
    }

    /// Write to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini()
            .write_to_file_opt(path, write_option())
            .map_err(write_err)
    }

    /// Effective settings as `(section, key, value)` in file order.
    ///
    /// Unset optional values are empty strings.
    pub fn entries(&self) -> Vec<(String, String, String)> {
        let ini = self.to_ini();
        ini.iter()
            .filter_map(|(section, props)| section.map(|s| (s, props)))
            .flat_map(|(section, props)| {
                props
                    .iter()
                    .map(move |(k, v)| (section.to_string(), k.to_string(), v.to_string()))
            })
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Backslashes are literal so Windows paths survive a load.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..Default::default()
    }
}

/// Writes values verbatim, matching [`parse_option`].
fn write_option() -> WriteOption {
    WriteOption {
        escape_policy: EscapePolicy::Nothing,
        ..Default::default()
    }
}

fn parse_positive(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<u64, ConfigError> {
    match parse_number::<u64>(section, key, value)? {
        0 => Err(ConfigError::InvalidValue {
            section,
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        n => Ok(n),
    }
}
