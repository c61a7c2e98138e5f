//! Storage trait abstraction.

use async_trait::async_trait;
use ivy_core::PlanSnapshot;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored snapshot moved on since the caller read it
    #[error("Version conflict: stored version is {stored}, cannot save version {attempted}")]
    VersionConflict {
        /// Version currently stored
        stored: u64,
        /// Version the caller tried to write
        attempted: u64,
    },

    /// Nothing stored yet
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Storage abstraction for plan snapshots.
///
/// Saves are optimistic: a snapshot may only replace the version it was
/// derived from.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, if any.
    async fn load(&self) -> Result<Option<PlanSnapshot>>;

    /// Save a snapshot whose version is exactly one past the stored one.
    async fn save(&mut self, snapshot: &PlanSnapshot) -> Result<()>;

    /// Whether a snapshot has been stored.
    async fn exists(&self) -> bool;

    /// Load the stored snapshot, failing when there is none.
    async fn load_required(&self) -> Result<PlanSnapshot> {
        self.load()
            .await?
            .ok_or_else(|| StorageError::NotFound("plan snapshot".to_string()))
    }
}
