//! Snapshot persistence errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing the snapshot file.
///
/// None of these are fatal: a failed write loses one cycle, a failed read
/// means "no update this tick".
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write snapshot {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}
