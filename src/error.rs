//! Error types for the manager
//!
//! The first four variants are the manager's own failure taxonomy; the rest
//! are ambient failures (config files, I/O, outbound HTTP).

use crate::storage::StorageError;
use thiserror::Error;

/// Result type alias for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Error type for manager operations
#[derive(Error, Debug)]
pub enum ManagerError {
    /// A referenced worker or mirror status does not exist
    #[error("{0}")]
    NotFound(String),

    /// A command or status update names a worker the registry cannot resolve
    #[error("{0}")]
    InvalidWorker(String),

    /// The storage adapter failed
    #[error("failed to {action}: {cause}")]
    Backend { action: String, cause: String },

    /// Inbound payload could not be parsed as the expected entity
    #[error("{0}")]
    Malformed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ManagerError {
    /// Wrap a storage failure that happened while performing `action`.
    ///
    /// Missing keys stay `NotFound`; everything else becomes `Backend` with
    /// the adapter's message kept verbatim as the cause.
    pub fn from_storage(action: impl Into<String>, err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ManagerError::NotFound(msg),
            other => ManagerError::Backend {
                action: action.into(),
                cause: other.to_string(),
            },
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ManagerError::NotFound(_) => "not_found",
            ManagerError::InvalidWorker(_) => "invalid_worker",
            ManagerError::Backend { .. } => "backend",
            ManagerError::Malformed(_) => "malformed",
            ManagerError::Config(_) => "config",
            ManagerError::Io(_) => "io",
            ManagerError::Yaml(_) => "yaml",
            ManagerError::Json(_) => "json",
            ManagerError::Http(_) => "http",
        }
    }
}
