//! Core data structures
//!
//! Worker identities, per-mirror status reports and operator commands.

mod command;
mod ids;
mod status;
mod timestamp;
mod worker;

pub use command::{ClientCommand, CmdVerb, WorkerCommand};
pub use ids::{MirrorId, WorkerId};
pub use status::{MirrorStatus, SyncStatus};
pub use timestamp::Timestamp;
pub use worker::WorkerRecord;
