//! Stop registry: the known stops of every line and their coordinates.
//!
//! The registry is loaded once at startup from a JSON array and never
//! mutated afterwards. Callers share it behind an `Arc`.
//!
//! ```text
//! [{"stopName": "...", "line": "...", "latitude": 35.6, "longitude": 139.9}, ...]
//! ```
//!
//! A registry that cannot be read, does not decode, or holds no stops is a
//! [`RegistryError`]; the application refuses to start polling without one.

mod error;

pub use error::RegistryError;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A known stop on a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecord {
    pub stop_name: String,
    pub line: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl StopRecord {
    pub fn new(
        line: impl Into<String>,
        stop_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            stop_name: stop_name.into(),
            line: line.into(),
            latitude,
            longitude,
        }
    }
}

/// Immutable lookup of `(line, stop name)` to [`StopRecord`].
///
/// When the source lists the same `(line, stop name)` twice, the first entry
/// wins.
#[derive(Debug, Clone, Default)]
pub struct StopRegistry {
    records: Vec<StopRecord>,
    index: HashMap<String, HashMap<String, usize>>,
}

impl StopRegistry {
    /// Build a registry from already-decoded records.
    pub fn from_records(records: Vec<StopRecord>) -> Self {
        let mut index: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            index
                .entry(record.line.clone())
                .or_default()
                .entry(record.stop_name.clone())
                .or_insert(position);
        }
        Self { records, index }
    }

    /// Load and validate the registry file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let records: Vec<StopRecord> =
            serde_json::from_slice(&raw).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let registry = Self::from_records(records);
        if registry.is_empty() {
            return Err(RegistryError::Empty(path.to_path_buf()));
        }

        tracing::info!(
            path = %path.display(),
            stops = registry.len(),
            lines = registry.index.len(),
            "Loaded stop registry"
        );
        Ok(registry)
    }

    /// Find the record for a stop name on a given line.
    pub fn lookup(&self, line: &str, stop_name: &str) -> Option<&StopRecord> {
        self.index
            .get(line)
            .and_then(|stops| stops.get(stop_name))
            .map(|&position| &self.records[position])
    }

    /// Number of records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when at least one stop is registered for `line`.
    pub fn has_line(&self, line: &str) -> bool {
        self.index.contains_key(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_registry(temp: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = temp.path().join("bus_stop.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_lookup_is_scoped_to_line() {
        let registry = StopRegistry::from_records(vec![
            StopRecord::new("L1", "A", 1.0, 1.0),
            StopRecord::new("L2", "A", 9.0, 9.0),
        ]);

        assert_eq!(registry.lookup("L1", "A").unwrap().latitude, 1.0);
        assert_eq!(registry.lookup("L2", "A").unwrap().latitude, 9.0);
        assert!(registry.lookup("L3", "A").is_none());
        assert!(registry.lookup("L1", "B").is_none());
    }

    #[test]
    fn test_duplicate_entries_first_wins() {
        let registry = StopRegistry::from_records(vec![
            StopRecord::new("L1", "A", 1.0, 1.0),
            StopRecord::new("L1", "A", 2.0, 2.0),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("L1", "A").unwrap().latitude, 1.0);
    }

    #[test]
    fn test_load_valid_file() {
        let temp = TempDir::new().unwrap();
        let path = write_registry(
            &temp,
            r#"[
                {"stopName": "駅前", "line": "系統01", "latitude": 35.7, "longitude": 139.9},
                {"stopName": "高校前", "line": "系統01", "latitude": 35.71, "longitude": 139.91}
            ]"#,
        );

        let registry = StopRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.has_line("系統01"));
        assert_eq!(registry.lookup("系統01", "高校前").unwrap().longitude, 139.91);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = StopRegistry::load(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
    }

    #[test]
    fn test_load_missing_field_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_registry(&temp, r#"[{"stopName": "A", "line": "L1", "latitude": 1.0}]"#);

        let err = StopRegistry::load(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_load_empty_array() {
        let temp = TempDir::new().unwrap();
        let path = write_registry(&temp, "[]");

        let err = StopRegistry::load(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Empty(_)));
    }

    #[test]
    fn test_has_line() {
        let registry = StopRegistry::from_records(vec![StopRecord::new("L1", "A", 1.0, 1.0)]);
        assert!(registry.has_line("L1"));
        assert!(!registry.has_line("L2"));
        assert!(!StopRegistry::default().has_line("L1"));
        assert!(StopRegistry::default().is_empty());
    }
}
