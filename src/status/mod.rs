//! Mirror status store
//!
//! Records the sync status each worker reports for each of its mirrors and
//! projects them into the fleet-wide job view.
//!
//! # Registered-worker policy
//!
//! By default a status update is accepted from any worker ID, registered or
//! not: status ingestion and worker registration are decoupled. With
//! `require_registered_worker_for_status` set, updates from unknown workers
//! are rejected with `InvalidWorker`.

mod aggregate;

pub use aggregate::{aggregate, AggregatedJob};

use crate::metrics;
use crate::model::{MirrorId, MirrorStatus, WorkerId};
use crate::registry::WorkerRegistry;
use crate::storage::{StorageAdapter, StorageError};
use crate::{ManagerError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// CRUD over per-(worker, mirror) statuses
#[derive(Clone)]
pub struct StatusStore {
    adapter: Arc<dyn StorageAdapter>,
    registry: WorkerRegistry,
    require_registered_worker: bool,
}

impl StatusStore {
    pub fn new(
        adapter: Arc<dyn StorageAdapter>,
        registry: WorkerRegistry,
        require_registered_worker: bool,
    ) -> Self {
        Self {
            adapter,
            registry,
            require_registered_worker,
        }
    }

    pub fn requires_registered_worker(&self) -> bool {
        self.require_registered_worker
    }

    /// The status stored under `(mirror_id, worker_id)`
    pub fn get_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
    ) -> Result<MirrorStatus> {
        self.adapter
            .get_mirror_status(worker_id, mirror_id)
            .map_err(|e| {
                ManagerError::from_storage(
                    format!("get job {} of worker {}", mirror_id, worker_id),
                    e,
                )
            })
    }

    /// Upsert a status under `(mirror_id, worker_id)`, returning the stored value
    ///
    /// Blank `name`/`worker` fields in the report are filled in from the key;
    /// a report that names a different mirror or worker is `Malformed`.
    pub fn update_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
        mut status: MirrorStatus,
    ) -> Result<MirrorStatus> {
        if worker_id.is_empty() || mirror_id.is_empty() {
            return Err(ManagerError::Malformed(
                "mirror name and worker id should not be empty".to_string(),
            ));
        }
        if status.name.is_empty() {
            status.name = mirror_id.clone();
        }
        if status.worker.is_empty() {
            status.worker = worker_id.clone();
        }
        if &status.name != mirror_id || &status.worker != worker_id {
            return Err(ManagerError::Malformed(format!(
                "status for {}@{} posted to {}@{}",
                status.name, status.worker, mirror_id, worker_id
            )));
        }

        if self.require_registered_worker {
            self.registry.resolve(worker_id)?;
        }

        // Read only to report transitions; the write below is a single upsert.
        let previous = self.adapter.get_mirror_status(worker_id, mirror_id);

        let stored = self
            .adapter
            .update_mirror_status(worker_id, mirror_id, &status)
            .map_err(|e| {
                metrics::record_backend_error("update_mirror_status");
                ManagerError::from_storage(
                    format!("update job {} of worker {}", mirror_id, worker_id),
                    e,
                )
            })?;

        metrics::record_status_update(stored.status.as_str());
        match previous {
            Ok(prev) if prev.status != stored.status => info!(
                worker = %worker_id,
                mirror = %mirror_id,
                from = %prev.status,
                to = %stored.status,
                "Job status changed"
            ),
            Ok(_) => debug!(
                worker = %worker_id,
                mirror = %mirror_id,
                status = %stored.status,
                "Job status refreshed"
            ),
            Err(StorageError::NotFound(_)) => info!(
                worker = %worker_id,
                mirror = %mirror_id,
                status = %stored.status,
                "New job reported"
            ),
            Err(e) => warn!(
                worker = %worker_id,
                mirror = %mirror_id,
                status = %stored.status,
                error = %e,
                "Stored job updated but its previous status could not be read"
            ),
        }

        Ok(stored)
    }

    /// All statuses reported by one worker
    ///
    /// Any adapter failure, including a missing key, is reported as `Backend`.
    pub fn list_mirror_status(&self, worker_id: &WorkerId) -> Result<Vec<MirrorStatus>> {
        self.adapter.list_mirror_status(worker_id).map_err(|e| {
            metrics::record_backend_error("list_mirror_status");
            ManagerError::Backend {
                action: format!("list jobs of worker {}", worker_id),
                cause: e.to_string(),
            }
        })
    }

    /// Every stored status across all workers
    pub fn list_all_mirror_status(&self) -> Result<Vec<MirrorStatus>> {
        self.adapter.list_all_mirror_status().map_err(|e| {
            metrics::record_backend_error("list_all_mirror_status");
            ManagerError::Backend {
                action: "list all jobs".to_string(),
                cause: e.to_string(),
            }
        })
    }

    /// The fleet job board, one entry per mirror
    ///
    /// Computed from a point-in-time scan; concurrent updates may or may not
    /// be reflected.
    pub fn aggregated_jobs(&self) -> Result<Vec<AggregatedJob>> {
        let statuses = self.list_all_mirror_status()?;
        Ok(aggregate(statuses))
    }
}
