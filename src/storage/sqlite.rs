//! SQLite storage backend

use super::{status_not_found, worker_not_found, Result, StorageAdapter, StorageError};
use crate::model::{MirrorId, MirrorStatus, SyncStatus, Timestamp, WorkerId, WorkerRecord};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Storage backed by an embedded SQLite database file
///
/// The connection sits behind a mutex; each adapter call holds it for one
/// statement, and every write is a single `INSERT OR REPLACE`.
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteAdapter {
    /// Open or create the database file
    ///
    /// The schema is created by [`StorageAdapter::init`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            }
        }

        tracing::info!(path = %path.display(), "Opening manager database");

        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("database connection lock poisoned".to_string()))
    }
}

impl StorageAdapter for SqliteAdapter {
    fn init(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS workers (
                id TEXT PRIMARY KEY,
                url TEXT
            );

            CREATE TABLE IF NOT EXISTS mirror_status (
                mirror TEXT NOT NULL,
                worker TEXT NOT NULL,
                is_master INTEGER NOT NULL,
                status TEXT NOT NULL,
                last_update TEXT NOT NULL,
                upstream TEXT NOT NULL,
                size TEXT NOT NULL,
                PRIMARY KEY (mirror, worker)
            );

            CREATE INDEX IF NOT EXISTS idx_mirror_status_worker ON mirror_status(worker);
            "#,
        )?;

        Ok(())
    }

    fn close(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        tracing::debug!(path = %self.path.display(), "Manager database checkpointed");
        Ok(())
    }

    fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, url FROM workers ORDER BY id")?;
        let rows = stmt.query_map([], row_to_worker)?;

        let mut workers = Vec::new();
        for row in rows {
            workers.push(row?);
        }
        Ok(workers)
    }

    fn get_worker(&self, worker_id: &WorkerId) -> Result<WorkerRecord> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, url FROM workers WHERE id = ?",
            params![worker_id.as_str()],
            row_to_worker,
        )
        .optional()?
        .ok_or_else(|| worker_not_found(worker_id))
    }

    fn create_worker(&self, worker: &WorkerRecord) -> Result<WorkerRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO workers (id, url) VALUES (?, ?)",
            params![worker.id.as_str(), worker.url.as_deref()],
        )?;
        Ok(worker.clone())
    }

    fn get_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
    ) -> Result<MirrorStatus> {
        let conn = self.conn()?;
        conn.query_row(
            r#"
            SELECT mirror, worker, is_master, status, last_update, upstream, size
            FROM mirror_status
            WHERE mirror = ? AND worker = ?
            "#,
            params![mirror_id.as_str(), worker_id.as_str()],
            row_to_status,
        )
        .optional()?
        .ok_or_else(|| status_not_found(worker_id, mirror_id))
    }

    fn update_mirror_status(
        &self,
        worker_id: &WorkerId,
        mirror_id: &MirrorId,
        status: &MirrorStatus,
    ) -> Result<MirrorStatus> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO mirror_status (
                mirror, worker, is_master, status, last_update, upstream, size
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                mirror_id.as_str(),
                worker_id.as_str(),
                status.is_master,
                status.status.as_str(),
                status.last_update.as_str(),
                &status.upstream,
                &status.size,
            ],
        )?;
        Ok(status.clone())
    }

    fn list_mirror_status(&self, worker_id: &WorkerId) -> Result<Vec<MirrorStatus>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mirror, worker, is_master, status, last_update, upstream, size
            FROM mirror_status
            WHERE worker = ?
            ORDER BY mirror
            "#,
        )?;
        let rows = stmt.query_map(params![worker_id.as_str()], row_to_status)?;

        let mut statuses = Vec::new();
        for row in rows {
            statuses.push(row?);
        }
        Ok(statuses)
    }

    fn list_all_mirror_status(&self) -> Result<Vec<MirrorStatus>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mirror, worker, is_master, status, last_update, upstream, size
            FROM mirror_status
            ORDER BY mirror, worker
            "#,
        )?;
        let rows = stmt.query_map([], row_to_status)?;

        let mut statuses = Vec::new();
        for row in rows {
            statuses.push(row?);
        }
        Ok(statuses)
    }
}

// Row conversions

fn row_to_worker(row: &Row<'_>) -> rusqlite::Result<WorkerRecord> {
    Ok(WorkerRecord {
        id: WorkerId::new(row.get::<_, String>(0)?),
        url: row.get(1)?,
    })
}

fn row_to_status(row: &Row<'_>) -> rusqlite::Result<MirrorStatus> {
    let last_update: String = row.get(4)?;
    let last_update = Timestamp::parse(last_update)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(MirrorStatus {
        name: MirrorId::new(row.get::<_, String>(0)?),
        worker: WorkerId::new(row.get::<_, String>(1)?),
        is_master: row.get(2)?,
        status: SyncStatus::from_str_lossy(row.get::<_, String>(3)?.as_str()),
        last_update,
        upstream: row.get(5)?,
        size: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn open_temp() -> (SqliteAdapter, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let adapter = SqliteAdapter::open(temp_file.path()).unwrap();
        adapter.init().unwrap();
        (adapter, temp_file)
    }

    #[test]
    fn test_init_is_idempotent() {
        let (adapter, _temp) = open_temp();
        adapter.init().unwrap();
        assert!(adapter.path().exists());
    }

    #[test]
    fn test_worker_upsert_and_lookup() {
        let (adapter, _temp) = open_temp();

        adapter.create_worker(&WorkerRecord::new("w2")).unwrap();
        adapter
            .create_worker(&WorkerRecord::new("w1").with_url("http://w1:6000/cmd"))
            .unwrap();
        adapter.create_worker(&WorkerRecord::new("w2")).unwrap();

        let workers = adapter.list_workers().unwrap();
        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].id.as_str(), "w1");

        let w1 = adapter.get_worker(&WorkerId::new("w1")).unwrap();
        assert_eq!(w1.url.as_deref(), Some("http://w1:6000/cmd"));

        let missing = adapter.get_worker(&WorkerId::new("nope")).unwrap_err();
        assert_eq!(missing.to_string(), "no worker nope");
    }

    #[test]
    fn test_status_preserves_every_field() {
        let (adapter, _temp) = open_temp();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let status = MirrorStatus::new("arch", "w1", SyncStatus::Syncing, when)
            .master(true)
            .with_source("rsync://example.org/arch", "12GB");

        let w1 = WorkerId::new("w1");
        let arch = MirrorId::new("arch");
        adapter.update_mirror_status(&w1, &arch, &status).unwrap();

        assert_eq!(adapter.get_mirror_status(&w1, &arch).unwrap(), status);
    }

    #[test]
    fn test_status_keeps_reported_offset() {
        let (adapter, _temp) = open_temp();
        let when = Timestamp::parse("2024-05-01T16:00:00.5+08:00").unwrap();
        let status = MirrorStatus::new("m1", "W1", SyncStatus::Success, when);

        let w1 = WorkerId::new("W1");
        let m1 = MirrorId::new("m1");
        adapter.update_mirror_status(&w1, &m1, &status).unwrap();

        let stored = adapter.get_mirror_status(&w1, &m1).unwrap();
        assert_eq!(stored.last_update.as_str(), "2024-05-01T16:00:00.5+08:00");
        assert_eq!(stored, status);
    }

    #[test]
    fn test_status_listing_and_overwrite() {
        let (adapter, _temp) = open_temp();
        let now = Utc::now();
        let w1 = WorkerId::new("w1");
        let w2 = WorkerId::new("w2");

        for (mirror, worker) in [("debian", &w1), ("arch", &w1), ("arch", &w2)] {
            let status = MirrorStatus::new(mirror, worker.clone(), SyncStatus::Success, now);
            adapter
                .update_mirror_status(worker, &MirrorId::new(mirror), &status)
                .unwrap();
        }

        let failed = MirrorStatus::new("arch", "w1", SyncStatus::Failed, now);
        adapter
            .update_mirror_status(&w1, &MirrorId::new("arch"), &failed)
            .unwrap();

        let mine = adapter.list_mirror_status(&w1).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].name.as_str(), "arch");
        assert_eq!(mine[0].status, SyncStatus::Failed);

        let all = adapter.list_all_mirror_status().unwrap();
        assert_eq!(all.len(), 3);

        let missing = adapter
            .get_mirror_status(&w2, &MirrorId::new("debian"))
            .unwrap_err();
        assert_eq!(missing.to_string(), "no mirror debian exists in worker w2");
    }

    #[test]
    fn test_close_then_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let adapter = SqliteAdapter::open(temp_file.path()).unwrap();
            adapter.init().unwrap();
            adapter.create_worker(&WorkerRecord::new("w1")).unwrap();
            adapter.close().unwrap();
        }

        let adapter = SqliteAdapter::open(temp_file.path()).unwrap();
        adapter.init().unwrap();
        assert_eq!(adapter.list_workers().unwrap().len(), 1);
    }
}
