//! File-backed snapshot persistence.
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a concurrent reader sees either the previous snapshot or the new one,
//! never a partial file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{Snapshot, SnapshotError};

/// The snapshot file shared by the poll scheduler (writer) and the change
/// watcher (reader).
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replace the snapshot file atomically.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let bytes = snapshot.to_json()?;
        let write_err = |source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &bytes).await.map_err(write_err)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(write_err)?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            "Snapshot written"
        );
        Ok(())
    }

    /// Read and decode the current snapshot.
    pub async fn load(&self) -> Result<Snapshot, SnapshotError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: self.path.clone(),
                source,
            })?;

        Snapshot::from_json(&bytes).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Last modification time of the snapshot file.
    pub async fn modified(&self) -> Result<SystemTime, SnapshotError> {
        let read_err = |source| SnapshotError::Read {
            path: self.path.clone(),
            source,
        };

        tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map_err(read_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MatchedBusPosition;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let at = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Snapshot::new(
            at,
            vec![MatchedBusPosition {
                line: "L1".to_string(),
                stop_name: "A".to_string(),
                latitude: 35.0,
                longitude: 139.0,
            }],
        )
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("bus_location.json"));

        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("bus_location.json"));

        store.save(&sample()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["bus_location.json"]);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("out").join("bus_location.json"));

        store.save(&sample()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("bus_location.json"));

        store.save(&sample()).await.unwrap();
        let empty = Snapshot::new(sample().captured_at, vec![]);
        store.save(&empty).await.unwrap();

        assert!(store.load().await.unwrap().positions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("absent.json"));

        assert!(matches!(store.modified().await, Err(SnapshotError::Read { .. })));
        assert!(matches!(store.load().await, Err(SnapshotError::Read { .. })));
    }

    #[tokio::test]
    async fn test_garbage_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bus_location.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = SnapshotStore::new(path);
        assert!(matches!(store.load().await, Err(SnapshotError::Parse { .. })));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = SnapshotStore::new("/data/bus_location.json");
        assert_eq!(store.temp_path(), PathBuf::from("/data/bus_location.json.tmp"));
    }
}
