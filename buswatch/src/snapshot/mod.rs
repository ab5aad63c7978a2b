//! Snapshot of all matched bus positions, and its on-disk form.
//!
//! ```text
//! {
//!     "capturedAt": "2025-03-01 08:15:00",
//!     "positions": [
//!         {"line": "系統01", "stopName": "駅前", "latitude": 35.7, "longitude": 139.9}
//!     ]
//! }
//! ```
//!
//! The poll scheduler replaces the whole file every cycle; there is no merge
//! with, or history of, earlier snapshots.

mod error;
mod store;

pub use error::SnapshotError;
pub use store::SnapshotStore;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::registry::StopRecord;

/// `capturedAt` format. Second precision, local wall-clock time.
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A running bus located at a registered stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedBusPosition {
    pub line: String,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&StopRecord> for MatchedBusPosition {
    fn from(record: &StopRecord) -> Self {
        Self {
            line: record.line.clone(),
            stop_name: record.stop_name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

/// All bus positions found in one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(with = "captured_at")]
    pub captured_at: NaiveDateTime,
    pub positions: Vec<MatchedBusPosition>,
}

impl Snapshot {
    /// Create a snapshot. The timestamp is truncated to whole seconds so it
    /// survives a round trip through the file format unchanged.
    pub fn new(captured_at: NaiveDateTime, positions: Vec<MatchedBusPosition>) -> Self {
        Self {
            captured_at: captured_at.with_nanosecond(0).unwrap_or(captured_at),
            positions,
        }
    }

    /// `capturedAt` as written to disk.
    pub fn captured_at_string(&self) -> String {
        self.captured_at.format(CAPTURED_AT_FORMAT).to_string()
    }

    /// First position (in snapshot order) at the given stop.
    pub fn first_at_stop(&self, stop_name: &str) -> Option<&MatchedBusPosition> {
        self.positions.iter().find(|p| p.stop_name == stop_name)
    }

    /// Encode as pretty JSON (four-space indent, non-ASCII kept as-is).
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .map_err(SnapshotError::Encode)?;
        Ok(buffer)
    }

    /// Decode from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

mod captured_at {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CAPTURED_AT_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(CAPTURED_AT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, CAPTURED_AT_FORMAT).map_err(serde::de::Error::custom)
    }
}
