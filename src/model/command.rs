//! Operator commands and the messages relayed to workers

use super::{MirrorId, WorkerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command verbs understood by workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmdVerb {
    Start,
    Stop,
    Restart,
    Reschedule,
    Reload,
    Ping,
}

impl CmdVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmdVerb::Start => "start",
            CmdVerb::Stop => "stop",
            CmdVerb::Restart => "restart",
            CmdVerb::Reschedule => "reschedule",
            CmdVerb::Reload => "reload",
            CmdVerb::Ping => "ping",
        }
    }
}

impl fmt::Display for CmdVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command issued by an operator against a mirror on a specific worker
///
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCommand {
    pub cmd: CmdVerb,
    pub mirror_id: MirrorId,
    pub worker_id: WorkerId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl ClientCommand {
    pub fn new(cmd: CmdVerb, mirror_id: impl Into<MirrorId>, worker_id: impl Into<WorkerId>) -> Self {
        Self {
            cmd,
            mirror_id: mirror_id.into(),
            worker_id: worker_id.into(),
            args: Vec::new(),
        }
    }
}

/// The message delivered to a worker's command endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCommand {
    pub cmd: CmdVerb,
    pub mirror_id: MirrorId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl From<&ClientCommand> for WorkerCommand {
    fn from(cmd: &ClientCommand) -> Self {
        Self {
            cmd: cmd.cmd,
            mirror_id: cmd.mirror_id.clone(),
            args: cmd.args.clone(),
        }
    }
}
