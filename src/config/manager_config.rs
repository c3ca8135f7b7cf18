//! Manager configuration file handling
//!
//! Loads and manages the ~/.config/mirrorfleet/manager.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body size limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    14242
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl ServerConfig {
    /// `addr:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Memory,
    Sqlite,
}

impl std::str::FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(DbType::Memory),
            "sqlite" => Ok(DbType::Sqlite),
            other => Err(format!("unknown db type '{}' (expected memory or sqlite)", other)),
        }
    }
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_type")]
    pub db_type: DbType,

    /// Database file, used by the sqlite backend
    #[serde(default = "default_db_file")]
    pub db_file: PathBuf,
}

fn default_db_type() -> DbType {
    DbType::Sqlite
}

fn default_db_file() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("mirrorfleet");
    path.push("manager.db");
    path
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_type: default_db_type(),
            db_file: default_db_file(),
        }
    }
}

/// Ingestion policy switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Reject status updates from workers that never registered.
    ///
    /// Off by default: status ingestion and worker registration are decoupled.
    #[serde(default)]
    pub require_registered_worker_for_status: bool,
}

/// Outbound command delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Upper bound for a single delivery to a worker
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl CommandConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Manager configuration
///
/// Represents the complete ~/.config/mirrorfleet/manager.yaml file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Verbose logging
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub files: StorageConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub command: CommandConfig,
}

impl ManagerConfig {
    /// Create a configuration with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default path (~/.config/mirrorfleet/manager.yaml)
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::ManagerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading manager configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            bind = %config.server.bind_address(),
            db_type = ?config.files.db_type,
            require_registered_worker = config.policy.require_registered_worker_for_status,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving manager configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/mirrorfleet/manager.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("mirrorfleet");
        path.push("manager.yaml");
        path
    }
}
