//! In-memory storage backend

use super::{status_not_found, worker_not_found, Result, StorageAdapter, StorageError};
use crate::model::{MirrorId, MirrorStatus, WorkerId, WorkerRecord};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type StatusKey = (MirrorId, WorkerId);

/// Process-local storage backed by ordered maps
///
/// Ordered maps keep listings stable between calls.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    workers: RwLock<BTreeMap<WorkerId, WorkerRecord>>,
    statuses: RwLock<BTreeMap<StatusKey, MirrorStatus>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<'a, T>(lock: &'a RwLock<T>) -> Result<RwLockReadGuard<'a, T>> {
        lock.read()
            .map_err(|_| StorageError::Backend("storage lock poisoned".to_string()))
    }

    fn write<'a, T>(lock: &'a RwLock<T>) -> Result<RwLockWriteGuard<'a, T>> {
        lock.write()
            .map_err(|_| StorageError::Backend("storage lock poisoned".to_string()))
    }
}

impl StorageAdapter for MemoryAdapter {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        let workers = Self::read(&self.workers)?;
        Ok(workers.values().cloned().collect())
    }

    fn get_worker(&self, worker_id: &WorkerId) -> Result<WorkerRecord> {
        let workers = Self::read(&self.workers)?;
        workers
            .get(worker_id)
            .cloned()
            .ok_or_else(|| worker_not_found(worker_id))
    }

    fn create_worker(&self, worker: &WorkerRecord) -> Result<WorkerRecord> {
        let mut workers = Self::write(&self.workers)?;
        workers.insert(worker.id.clone(), worker.clone());
        Ok(worker.clone())
    }

    fn get_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
    ) -> Result<MirrorStatus> {
        let statuses = Self::read(&self.statuses)?;
        statuses
            .get(&(mirror_id.clone(), worker_id.clone()))
            .cloned()
            .ok_or_else(|| status_not_found(worker_id, mirror_id))
    }

    fn update_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
        status: &MirrorStatus,
    ) -> Result<MirrorStatus> {
        let mut statuses = Self::write(&self.statuses)?;
        statuses.insert((mirror_id.clone(), worker_id.clone()), status.clone());
        Ok(status.clone())
    }

    fn list_mirror_status(&self, worker_id: &WorkerId) -> Result<Vec<MirrorStatus>> {
        let statuses = Self::read(&self.statuses)?;
        Ok(statuses
            .iter()
            .filter(|((_, w), _)| w == worker_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn list_all_mirror_status(&self) -> Result<Vec<MirrorStatus>> {
        let statuses = Self::read(&self.statuses)?;
        Ok(statuses.values().cloned().collect())
    }
}
