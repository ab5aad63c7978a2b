//! Common utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use buswatch::config::{config_file_path, ConfigFile};
use buswatch::logging::{self, LoggingGuard};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// The config file in effect: `--config` if given, else the default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Load configuration.
///
/// An explicit `--config` must exist. A missing default file means defaults;
/// a present but broken one is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = resolve_config_path(explicit);

    if explicit.is_none() && !path.exists() {
        return Ok(ConfigFile::default());
    }

    Ok(ConfigFile::load_from(&path)?)
}

/// Install logging. Must run before the runtime is built.
pub fn init_logging(verbose: bool, config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    Ok(logging::init(verbose, config.logging.directory.as_deref())?)
}

pub fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/tmp/elsewhere.ini");
        assert_eq!(resolve_config_path(Some(&path)), path);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("absent.ini")));
        assert!(matches!(result, Err(CliError::ConfigFile(_))));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[lines]\nL1 = 42\n[poll]\ninterval_secs = 15\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.lines.len(), 1);
        assert_eq!(config.poll.interval_secs, 15);
    }

    #[test]
    fn test_broken_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[poll]\ninterval_secs = -1\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
