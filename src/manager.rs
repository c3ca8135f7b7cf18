//! Manager instance
//!
//! Wires the worker registry, status store and command dispatcher over one
//! shared storage adapter. Each `Manager` is an owned value; nothing here is
//! process-global.

use crate::config::ManagerConfig;
use crate::dispatch::{CommandDispatcher, CommandTransport, HttpTransport};
use crate::registry::WorkerRegistry;
use crate::status::StatusStore;
use crate::storage::{self, StorageAdapter};
use crate::{ManagerError, Result};
use std::sync::Arc;

/// The fleet manager
pub struct Manager {
    config: ManagerConfig,
    adapter: Arc<dyn StorageAdapter>,
    registry: WorkerRegistry,
    statuses: StatusStore,
    dispatcher: CommandDispatcher,
}

impl Manager {
    /// Create a manager over an already initialized adapter, delivering
    /// commands over HTTP
    pub fn new(config: ManagerConfig, adapter: Arc<dyn StorageAdapter>) -> Result<Self> {
        let transport = HttpTransport::new(config.command.timeout())?;
        Ok(Self::with_transport(config, adapter, Arc::new(transport)))
    }

    /// Create a manager with an explicit command transport
    pub fn with_transport(
        config: ManagerConfig,
        adapter: Arc<dyn StorageAdapter>,
        transport: Arc<dyn CommandTransport>,
    ) -> Self {
        let registry = WorkerRegistry::new(adapter.clone());
        let statuses = StatusStore::new(
            adapter.clone(),
            registry.clone(),
            config.policy.require_registered_worker_for_status,
        );
        let dispatcher = CommandDispatcher::new(registry.clone(), transport);

        Self {
            config,
            adapter,
            registry,
            statuses,
            dispatcher,
        }
    }

    /// Open the configured storage backend and build a manager over it
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        let adapter = storage::open_adapter(&config.files)
            .map_err(|e| ManagerError::from_storage("open storage", e))?;
        Self::new(config, adapter)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    pub fn statuses(&self) -> &StatusStore {
        &self.statuses
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Release the storage backend
    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Closing storage adapter");
        self.adapter
            .close()
            .map_err(|e| ManagerError::from_storage("close storage", e))
    }
}
