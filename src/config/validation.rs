//! Configuration validation
//!
//! Checks a manager configuration before the process binds or opens storage:
//! - Listener address and port are usable
//! - The sqlite backend has a database file
//! - Limits and timeouts are non-zero

use super::manager_config::{DbType, ManagerConfig};
use crate::ManagerError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a manager configuration, collecting every problem found
pub fn validate_config(config: &ManagerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.server.addr.trim().is_empty() {
        errors.push(ValidationError::new(
            "server.addr",
            "Listen address cannot be empty",
        ));
    }

    if config.server.port == 0 {
        errors.push(ValidationError::new(
            "server.port",
            "Port must be greater than 0",
        ));
    }

    if config.server.max_body_size == 0 {
        errors.push(ValidationError::new(
            "server.max_body_size",
            "Body size limit must be greater than 0",
        ));
    }

    if config.files.db_type == DbType::Sqlite && config.files.db_file.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "files.db_file",
            "sqlite backend requires a database file",
        ));
    }

    if config.command.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "command.timeout_secs",
            "Command timeout must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &ManagerConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ManagerError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
