//! Worker registry
//!
//! The authority on which workers exist and where they accept commands.
//! Registration is an idempotent upsert by worker ID; there is no
//! deregistration.

use crate::metrics;
use crate::model::{WorkerId, WorkerRecord};
use crate::storage::StorageAdapter;
use crate::{ManagerError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// CRUD over worker identities
#[derive(Clone)]
pub struct WorkerRegistry {
    adapter: Arc<dyn StorageAdapter>,
}

impl WorkerRegistry {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// All known workers, empty if none registered
    pub fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        self.adapter.list_workers().map_err(|e| {
            metrics::record_backend_error("list_workers");
            ManagerError::from_storage("list workers", e)
        })
    }

    /// A single worker, `NotFound` if it never registered
    pub fn get_worker(&self, worker_id: &WorkerId) -> Result<WorkerRecord> {
        self.adapter
            .get_worker(worker_id)
            .map_err(|e| ManagerError::from_storage(format!("get worker {}", worker_id), e))
    }

    /// Insert or overwrite a worker, returning the stored record
    pub fn register_worker(&self, worker: WorkerRecord) -> Result<WorkerRecord> {
        if worker.id.is_empty() {
            return Err(ManagerError::Malformed(
                "worker id should not be empty".to_string(),
            ));
        }

        let stored = self.adapter.create_worker(&worker).map_err(|e| {
            metrics::record_registration(false);
            metrics::record_backend_error("create_worker");
            ManagerError::from_storage(format!("register worker {}", worker.id), e)
        })?;

        metrics::record_registration(true);
        info!(
            worker = %stored.id,
            url = stored.url.as_deref().unwrap_or("-"),
            "Worker registered"
        );
        Ok(stored)
    }

    /// Look a worker up on behalf of a request that names it
    ///
    /// A missing worker is the caller's mistake, so it surfaces as
    /// `InvalidWorker` rather than `NotFound`.
    pub fn resolve(&self, worker_id: &WorkerId) -> Result<WorkerRecord> {
        match self.get_worker(worker_id) {
            Ok(worker) => Ok(worker),
            Err(ManagerError::NotFound(_)) => {
                debug!(worker = %worker_id, "Unresolved worker");
                Err(ManagerError::InvalidWorker(format!(
                    "invalid workerID {}",
                    worker_id
                )))
            }
            Err(e) => Err(e),
        }
    }
}
