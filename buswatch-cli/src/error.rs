//! CLI error type.

use std::fmt;

use buswatch::app::AppError;
use buswatch::config::ConfigError;
use buswatch::logging::LoggingError;
use buswatch::snapshot::SnapshotError;

/// Errors surfaced to the user as `Error: ...` with exit status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem detected by the CLI itself.
    Config(String),

    /// Configuration file could not be read, parsed or written.
    ConfigFile(ConfigError),

    /// Application failed to start or run.
    App(AppError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// Failed to create the Tokio runtime.
    Runtime(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<SnapshotError> for CliError {
    fn from(e: SnapshotError) -> Self {
        CliError::App(AppError::Snapshot(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_is_app_error() {
        let encode = serde_json::from_str::<u8>("not json").unwrap_err();
        let err: CliError = SnapshotError::Encode(encode).into();

        assert!(matches!(err, CliError::App(AppError::Snapshot(SnapshotError::Encode(_)))));
        assert!(err.to_string().starts_with("Snapshot error: "));
    }

    #[test]
    fn test_config_message_passes_through() {
        let err = CliError::Config("no lines configured".to_string());
        assert_eq!(err.to_string(), "no lines configured");
    }
}
