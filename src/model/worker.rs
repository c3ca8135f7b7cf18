//! Worker identity records

use super::WorkerId;
use serde::{Deserialize, Serialize};

/// A registered worker
///
/// Created on first registration and overwritten on every re-registration
/// with the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Worker ID, unique across the fleet
    pub id: WorkerId,

    /// Address at which the worker accepts commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl WorkerRecord {
    /// Create a worker record without a command endpoint
    pub fn new(id: impl Into<WorkerId>) -> Self {
        Self {
            id: id.into(),
            url: None,
        }
    }

    /// Builder: set the command endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The command endpoint, ignoring blank values
    pub fn command_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}
