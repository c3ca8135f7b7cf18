//! Configuration system
//!
//! Loads ~/.config/mirrorfleet/manager.yaml with support for:
//! - Listener address, port and body size limit
//! - Storage backend selection (memory or sqlite)
//! - The registered-worker policy for status ingestion
//! - Command delivery timeout

mod manager_config;
pub mod validation;

pub use manager_config::{
    CommandConfig, DbType, ManagerConfig, PolicyConfig, ServerConfig, StorageConfig,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
