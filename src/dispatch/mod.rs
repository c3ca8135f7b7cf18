//! Command dispatcher
//!
//! Relays operator commands to the worker that owns the mirror.
//!
//! # Flow
//!
//! 1. Resolve the target worker through the registry. Unknown workers, and
//!    workers registered without a command endpoint, are rejected here
//!    before any network I/O.
//! 2. Strip the command down to the `WorkerCommand` the worker understands.
//! 3. Hand it to a background task that makes one bounded delivery attempt.
//!
//! A successful dispatch means "accepted for delivery to a known worker",
//! never "executed by the worker". Delivery failures are logged and counted,
//! not retried and not reported back.

mod transport;

pub use transport::{CommandTransport, DeliveryError, HttpTransport};

use crate::metrics;
use crate::model::{ClientCommand, WorkerCommand};
use crate::registry::WorkerRegistry;
use crate::{ManagerError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates and forwards operator commands
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: WorkerRegistry,
    transport: Arc<dyn CommandTransport>,
}

impl CommandDispatcher {
    pub fn new(registry: WorkerRegistry, transport: Arc<dyn CommandTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Validate `command` and schedule its delivery
    ///
    /// Must be called from within a tokio runtime. No storage lock is held
    /// while the delivery is in flight.
    pub async fn dispatch(&self, command: ClientCommand) -> Result<()> {
        let verb = command.cmd.as_str();

        let worker = match self.registry.resolve(&command.worker_id) {
            Ok(worker) => worker,
            Err(e) => {
                metrics::record_command(verb, "rejected");
                return Err(e);
            }
        };

        let Some(url) = worker.command_url().map(str::to_string) else {
            metrics::record_command(verb, "rejected");
            return Err(ManagerError::InvalidWorker(format!(
                "worker {} has no command endpoint",
                worker.id
            )));
        };

        let worker_command = WorkerCommand::from(&command);
        metrics::record_command(verb, "accepted");
        info!(
            worker = %worker.id,
            mirror = %worker_command.mirror_id,
            cmd = verb,
            "Command accepted for delivery"
        );

        let transport = self.transport.clone();
        let worker_id = worker.id.clone();
        tokio::spawn(async move {
            match transport.deliver(&url, &worker_command).await {
                Ok(()) => {
                    metrics::record_command(worker_command.cmd.as_str(), "delivered");
                    debug!(worker = %worker_id, url = %url, "Command delivered");
                }
                Err(e) => {
                    metrics::record_command(worker_command.cmd.as_str(), "failed");
                    warn!(worker = %worker_id, error = %e, "Command delivery failed");
                }
            }
        });

        Ok(())
    }
}
