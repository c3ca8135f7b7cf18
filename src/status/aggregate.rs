//! Fleet-wide job view
//!
//! Collapses every `(mirror, worker)` status into one entry per mirror.
//! The winner for a mirror is the master's record; when no worker or several
//! workers claim master, the candidate with the smallest worker ID wins. The
//! result depends only on the set of statuses, never on the order they were
//! scanned in.

use crate::model::{MirrorId, MirrorStatus, SyncStatus, Timestamp, WorkerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the fleet job board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedJob {
    pub name: MirrorId,
    pub worker: WorkerId,
    pub is_master: bool,
    pub status: SyncStatus,
    pub last_update: Timestamp,
    /// `last_update` as Unix seconds, for dashboards that sort numerically
    pub last_update_ts: i64,
    pub upstream: String,
    pub size: String,
}

impl From<&MirrorStatus> for AggregatedJob {
    fn from(status: &MirrorStatus) -> Self {
        Self {
            name: status.name.clone(),
            worker: status.worker.clone(),
            is_master: status.is_master,
            status: status.status,
            last_update: status.last_update.clone(),
            last_update_ts: status.last_update.timestamp(),
            upstream: status.upstream.clone(),
            size: status.size.clone(),
        }
    }
}

/// Whether `candidate` should replace `current` as a mirror's representative
fn outranks(candidate: &MirrorStatus, current: &MirrorStatus) -> bool {
    match (candidate.is_master, current.is_master) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.worker < current.worker,
    }
}

/// Build the job board, sorted by mirror name
pub fn aggregate<I>(statuses: I) -> Vec<AggregatedJob>
where
    I: IntoIterator<Item = MirrorStatus>,
{
    let mut best: BTreeMap<MirrorId, MirrorStatus> = BTreeMap::new();

    for status in statuses {
        match best.get(&status.name) {
            Some(current) if !outranks(&status, current) => {}
            _ => {
                best.insert(status.name.clone(), status);
            }
        }
    }

    best.values().map(AggregatedJob::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn status(mirror: &str, worker: &str, is_master: bool, s: SyncStatus) -> MirrorStatus {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        MirrorStatus::new(mirror, worker, s, when).master(is_master)
    }

    #[test]
    fn test_master_wins() {
        let jobs = aggregate(vec![
            status("arch", "w1", false, SyncStatus::Failed),
            status("arch", "w2", true, SyncStatus::Success),
            status("arch", "w0", false, SyncStatus::Syncing),
        ]);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].worker.as_str(), "w2");
        assert_eq!(jobs[0].status, SyncStatus::Success);
    }

    #[test]
    fn test_no_master_picks_smallest_worker() {
        let jobs = aggregate(vec![
            status("arch", "w3", false, SyncStatus::Failed),
            status("arch", "w1", false, SyncStatus::Paused),
        ]);
        assert_eq!(jobs[0].worker.as_str(), "w1");
    }

    #[test]
    fn test_several_masters_pick_smallest_worker() {
        let jobs = aggregate(vec![
            status("arch", "wb", true, SyncStatus::Failed),
            status("arch", "wc", false, SyncStatus::Success),
            status("arch", "wa", true, SyncStatus::Paused),
        ]);
        assert_eq!(jobs[0].worker.as_str(), "wa");
    }

    #[test]
    fn test_order_independent() {
        let input = vec![
            status("debian", "w2", false, SyncStatus::Success),
            status("arch", "w1", true, SyncStatus::Success),
            status("debian", "w1", false, SyncStatus::Failed),
            status("arch", "w2", false, SyncStatus::Syncing),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let forward = aggregate(input);
        let backward = aggregate(reversed);
        assert_eq!(forward, backward);
        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );

        let names: Vec<&str> = forward.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["arch", "debian"]);
    }

    #[test]
    fn test_projection_fields() {
        let source = status("arch", "w1", true, SyncStatus::Success).with_source("u", "3GB");
        let job = AggregatedJob::from(&source);

        assert_eq!(job.last_update_ts, source.last_update.timestamp());
        assert_eq!(job.upstream, "u");
        assert_eq!(job.size, "3GB");
        assert!(job.is_master);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
