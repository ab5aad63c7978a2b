//! Application error types.

use std::fmt;

use crate::browser::BrowserError;
use crate::notify::NotifyError;
use crate::registry::RegistryError;
use crate::snapshot::SnapshotError;

use super::CREDENTIAL_ENV_VAR;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// Stop registry could not be loaded.
    Registry(RegistryError),

    /// Configuration is incomplete or inconsistent.
    Config(String),

    /// The notification credential is not set.
    MissingCredential,

    /// Failed to create the browser client.
    Browser(BrowserError),

    /// Failed to create the notification client.
    Notifier(NotifyError),

    /// A snapshot could not be persisted or encoded.
    Snapshot(SnapshotError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Registry(e) => write!(f, "Failed to load stop registry: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::MissingCredential => {
                write!(f, "{} is not set; cannot send notifications", CREDENTIAL_ENV_VAR)
            }
            AppError::Browser(e) => write!(f, "Failed to create browser client: {}", e),
            AppError::Notifier(e) => write!(f, "Failed to create notifier: {}", e),
            AppError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Registry(e) => Some(e),
            AppError::Browser(e) => Some(e),
            AppError::Notifier(e) => Some(e),
            AppError::Snapshot(e) => Some(e),
            AppError::Config(_) | AppError::MissingCredential => None,
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        AppError::Registry(e)
    }
}

impl From<SnapshotError> for AppError {
    fn from(e: SnapshotError) -> Self {
        AppError::Snapshot(e)
    }
}
