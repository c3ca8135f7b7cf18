//! Storage layer
//!
//! Defines the adapter trait the manager persists through, and the two
//! backends selectable from configuration:
//!
//! - **memory**: process-local maps, lost on restart
//! - **sqlite**: embedded SQLite database file
//!
//! Every implementation must be safe for concurrent use; registration and
//! status calls arrive from many workers at once. Each write is an atomic
//! upsert of a single key, so concurrent writers to the same key resolve as
//! last-write-wins without lost updates.

mod memory;
mod sqlite;

pub use memory::MemoryAdapter;
pub use sqlite::SqliteAdapter;

use crate::config::{DbType, StorageConfig};
use crate::model::{MirrorId, MirrorStatus, WorkerId, WorkerRecord};
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested key does not exist
    #[error("{0}")]
    NotFound(String),

    /// Backend failure, message kept verbatim
    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for persistence backends
pub trait StorageAdapter: Send + Sync {
    /// Prepare the backend (create schema, open files)
    fn init(&self) -> Result<()>;

    /// Flush and release the backend
    fn close(&self) -> Result<()>;

    /// All registered workers
    fn list_workers(&self) -> Result<Vec<WorkerRecord>>;

    /// A single worker, or `NotFound`
    fn get_worker(&self, worker_id: &WorkerId) -> Result<WorkerRecord>;

    /// Insert or overwrite a worker by ID
    fn create_worker(&self, worker: &WorkerRecord) -> Result<WorkerRecord>;

    /// A single status, or `NotFound`
    fn get_mirror_status(&self, worker_id: &WorkerId, mirror_id: &MirrorId)
        -> Result<MirrorStatus>;

    /// Insert or overwrite the status stored under `(mirror_id, worker_id)`
    fn update_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
        status: &MirrorStatus,
    ) -> Result<MirrorStatus>;

    /// All statuses reported by one worker
    fn list_mirror_status(&self, worker_id: &WorkerId) -> Result<Vec<MirrorStatus>>;

    /// Every stored status across all workers
    fn list_all_mirror_status(&self) -> Result<Vec<MirrorStatus>>;
}

pub(crate) fn worker_not_found(worker_id: &WorkerId) -> StorageError {
    StorageError::NotFound(format!("no worker {}", worker_id))
}

pub(crate) fn status_not_found(worker_id: &WorkerId, mirror_id: &MirrorId) -> StorageError {
    StorageError::NotFound(format!(
        "no mirror {} exists in worker {}",
        mirror_id, worker_id
    ))
}

/// Build and initialize the backend named in the configuration
pub fn open_adapter(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>> {
    let adapter: Arc<dyn StorageAdapter> = match config.db_type {
        DbType::Memory => Arc::new(MemoryAdapter::new()),
        DbType::Sqlite => Arc::new(SqliteAdapter::open(&config.db_file)?),
    };

    adapter.init()?;

    tracing::info!(db_type = ?config.db_type, "Storage adapter ready");
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory_adapter() {
        let config = StorageConfig {
            db_type: DbType::Memory,
            ..Default::default()
        };
        let adapter = open_adapter(&config).unwrap();
        assert!(adapter.list_workers().unwrap().is_empty());
    }

    #[test]
    fn test_open_sqlite_adapter() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            db_type: DbType::Sqlite,
            db_file: temp_dir.path().join("nested").join("manager.db"),
        };
        let adapter = open_adapter(&config).unwrap();
        adapter.create_worker(&WorkerRecord::new("w1")).unwrap();
        assert_eq!(adapter.list_workers().unwrap().len(), 1);
        assert!(config.db_file.exists());
    }

    #[test]
    fn test_not_found_messages() {
        let w = WorkerId::new("w1");
        let m = MirrorId::new("arch");
        assert_eq!(worker_not_found(&w).to_string(), "no worker w1");
        assert_eq!(
            status_not_found(&w, &m).to_string(),
            "no mirror arch exists in worker w1"
        );
    }
}
