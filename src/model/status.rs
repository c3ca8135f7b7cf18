//! Per-(mirror, worker) sync status as reported by workers

use super::{MirrorId, Timestamp, WorkerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sync state a worker reports for one of its mirrors
///
/// The manager never transitions this value itself; it stores whatever the
/// worker last asserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
    Syncing,
    Paused,
    Disabled,
    #[default]
    Unknown,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Paused => "paused",
            SyncStatus::Disabled => "disabled",
            SyncStatus::Unknown => "unknown",
        }
    }

    /// Lenient parse used when reading back from storage
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "success" => SyncStatus::Success,
            "failed" => SyncStatus::Failed,
            "syncing" => SyncStatus::Syncing,
            "paused" => SyncStatus::Paused,
            "disabled" => SyncStatus::Disabled,
            _ => SyncStatus::Unknown,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one mirror on one worker, keyed by `(name, worker)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorStatus {
    /// Mirror name
    #[serde(default)]
    pub name: MirrorId,

    /// Reporting worker
    #[serde(default)]
    pub worker: WorkerId,

    /// Whether this worker is the authoritative source for the mirror
    #[serde(default)]
    pub is_master: bool,

    #[serde(default)]
    pub status: SyncStatus,

    /// Set by the reporting worker
    pub last_update: Timestamp,

    #[serde(default)]
    pub upstream: String,

    /// Free-form human-readable size, e.g. "3GB"
    #[serde(default)]
    pub size: String,
}

impl MirrorStatus {
    /// Create a status record with empty informational fields
    pub fn new(
        name: impl Into<MirrorId>,
        worker: impl Into<WorkerId>,
        status: SyncStatus,
        last_update: impl Into<Timestamp>,
    ) -> Self {
        Self {
            name: name.into(),
            worker: worker.into(),
            is_master: false,
            status,
            last_update: last_update.into(),
            upstream: String::new(),
            size: String::new(),
        }
    }

    /// Builder: mark as master
    pub fn master(mut self, is_master: bool) -> Self {
        self.is_master = is_master;
        self
    }

    /// Builder: set upstream and size
    pub fn with_source(mut self, upstream: impl Into<String>, size: impl Into<String>) -> Self {
        self.upstream = upstream.into();
        self.size = size.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&SyncStatus::Success).unwrap(), "\"success\"");
        let parsed: SyncStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(parsed, SyncStatus::Paused);
        assert!(serde_json::from_str::<SyncStatus>("\"exploded\"").is_err());
    }

    #[test]
    fn test_lossy_parse() {
        for status in [
            SyncStatus::Success,
            SyncStatus::Failed,
            SyncStatus::Syncing,
            SyncStatus::Paused,
            SyncStatus::Disabled,
            SyncStatus::Unknown,
        ] {
            assert_eq!(SyncStatus::from_str_lossy(status.as_str()), status);
        }
        assert_eq!(SyncStatus::from_str_lossy("pre-syncing"), SyncStatus::Unknown);
    }

    #[test]
    fn test_mirror_status_json_keys() {
        let status = MirrorStatus::new("arch", "w1", SyncStatus::Success, Utc::now())
            .master(true)
            .with_source("rsync://upstream/arch", "3GB");
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["name"], "arch");
        assert_eq!(value["worker"], "w1");
        assert_eq!(value["is_master"], true);
        assert_eq!(value["status"], "success");
        assert_eq!(value["upstream"], "rsync://upstream/arch");
        assert_eq!(value["size"], "3GB");
    }

    #[test]
    fn test_reported_time_reads_back_verbatim() {
        let body = r#"{"name":"m1","worker":"W1","is_master":true,"status":"success","last_update":"2024-05-01T16:00:00.5+08:00","upstream":"u","size":"3GB"}"#;
        let status: MirrorStatus = serde_json::from_str(body).unwrap();
        assert_eq!(status.last_update.as_str(), "2024-05-01T16:00:00.5+08:00");
        assert_eq!(serde_json::to_string(&status).unwrap(), body);
    }
}
