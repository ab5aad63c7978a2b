//! Stop registry load errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the stop registry. All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read stop registry {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The registry file is not a valid array of stop records.
    #[error("failed to parse stop registry {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The registry decoded but lists no stops.
    #[error("stop registry {} contains no stops", .0.display())]
    Empty(PathBuf),
}
