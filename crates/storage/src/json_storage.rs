//! JSON file storage implementation.
//!
//! Stores the plan snapshot as one pretty-printed JSON file. Writes go to a
//! sibling temp file first and are renamed into place, so a crash never
//! leaves a half-written plan behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ivy_core::PlanSnapshot;
use tokio::fs;
use tracing::debug;

use super::{Result, SnapshotStore, StorageError};

/// File-based JSON snapshot store.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a store for `path`, creating its parent directory.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        Ok(Self { path })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<Option<PlanSnapshot>> {
        read_json(&self.path).await
    }

    async fn save(&mut self, snapshot: &PlanSnapshot) -> Result<()> {
        if let Some(stored) = read_json::<PlanSnapshot>(&self.path).await? {
            if stored.version + 1 != snapshot.version {
                return Err(StorageError::VersionConflict {
                    stored: stored.version,
                    attempted: snapshot.version,
                });
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!("Saved plan snapshot v{} to {}", snapshot.version, self.path.display());
        Ok(())
    }

    async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
