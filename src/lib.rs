//! MirrorFleet - control plane for mirror-synchronization workers
//!
//! The manager tracks which workers exist, records the sync status each
//! worker reports for each mirror it handles, aggregates those reports into
//! a fleet-wide job board, and relays operator commands to the worker that
//! owns a mirror.
//!
//! # Architecture
//!
//! - **model**: Worker records, mirror statuses, commands
//! - **storage**: Adapter trait with memory and SQLite backends
//! - **registry**: Worker registry
//! - **status**: Status store and job-board aggregation
//! - **dispatch**: Command validation and delivery to workers
//! - **server**: HTTP API (axum)
//! - **config**: YAML configuration and validation

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod server;
pub mod status;
pub mod storage;

// Re-exports
pub use error::{ManagerError, Result};
pub use manager::Manager;
pub use server::ManagerServer;
