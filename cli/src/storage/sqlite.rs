//! SQLite-backed sync state store.
//!
//! The store is shared by every sync worker, so all access goes through a
//! mutex around the single connection: writes are serialised and reads
//! never observe a half-applied mutation. WAL mode plus a 5 second busy
//! timeout keep a second process from deadlocking on the same file.

use crate::error::Result;
use crate::storage::schema::SCHEMA_SQL;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Busy-wait bound for concurrent opens of the same database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sync state for a single tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    /// Absolute path of the tracked file (primary key).
    pub file_path: String,
    /// Byte offset past which all mappable entries were emitted.
    pub last_offset: u64,
    /// File size observed at the start of the last successful pass.
    pub last_size: u64,
    /// Modification time (Unix seconds) observed at that point.
    pub last_mtime: i64,
    /// Session id derived from the first entry that carried one.
    pub trace_id: Option<String>,
    /// Cumulative count of entries processed; monotone across passes.
    pub entry_count: u64,
    /// Wall-clock (Unix seconds) of the last successful sync.
    pub last_sync_at: i64,
    /// Name of the backend the file was synced to.
    pub backend: String,
}

/// Database statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of files with a state row.
    pub tracked_files: u64,
    /// Rows in the dedup set.
    pub synced_entries: u64,
    /// Sum of per-file entry counts (not a dedup row count).
    pub total_entries: u64,
}

/// Durable store for per-file cursors, the dedup set, and the error log.
#[derive(Debug)]
pub struct SyncStore {
    conn: Mutex<Connection>,
}

impl SyncStore {
    /// Open or create the sync database, applying the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL survives a process kill between operations and lets readers
        // proceed while a writer holds the lock.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned mutex means another worker panicked mid-write; the
        // connection itself is still consistent (SQLite transactions), so
        // recover the guard rather than cascading the panic.
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Retrieve the sync state for a file, if any.
    pub fn get_state(&self, file_path: &str) -> Result<Option<SyncState>> {
        let conn = self.lock();
        let state = conn
            .query_row(
                "SELECT file_path, last_offset, last_size, last_mtime,
                        trace_id, entry_count, last_sync_at, backend
                 FROM sync_state
                 WHERE file_path = ?1",
                params![file_path],
                |row| {
                    Ok(SyncState {
                        file_path: row.get(0)?,
                        last_offset: row.get::<_, i64>(1)?.unsigned_abs(),
                        last_size: row.get::<_, i64>(2)?.unsigned_abs(),
                        last_mtime: row.get(3)?,
                        trace_id: row.get(4)?,
                        entry_count: row.get::<_, i64>(5)?.unsigned_abs(),
                        last_sync_at: row.get(6)?,
                        backend: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    /// Upsert the sync state for a file.
    pub fn save_state(&self, state: &SyncState) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO sync_state
             (file_path, last_offset, last_size, last_mtime, trace_id,
              entry_count, last_sync_at, backend)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                state.file_path,
                i64::try_from(state.last_offset).unwrap_or(i64::MAX),
                i64::try_from(state.last_size).unwrap_or(i64::MAX),
                state.last_mtime,
                state.trace_id,
                i64::try_from(state.entry_count).unwrap_or(i64::MAX),
                state.last_sync_at,
                state.backend,
            ],
        )?;
        Ok(())
    }

    /// Remove the sync state for a file.
    pub fn delete_state(&self, file_path: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM sync_state WHERE file_path = ?1",
            params![file_path],
        )?;
        Ok(())
    }

    /// All tracked file states, ordered by path.
    pub fn all_states(&self) -> Result<Vec<SyncState>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT file_path, last_offset, last_size, last_mtime,
                    trace_id, entry_count, last_sync_at, backend
             FROM sync_state
             ORDER BY file_path",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SyncState {
                file_path: row.get(0)?,
                last_offset: row.get::<_, i64>(1)?.unsigned_abs(),
                last_size: row.get::<_, i64>(2)?.unsigned_abs(),
                last_mtime: row.get(3)?,
                trace_id: row.get(4)?,
                entry_count: row.get::<_, i64>(5)?.unsigned_abs(),
                last_sync_at: row.get(6)?,
                backend: row.get(7)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Check whether an entry hash has already been emitted for a file.
    pub fn is_synced(&self, file_path: &str, entry_hash: &str) -> Result<bool> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM synced_entries
             WHERE file_path = ?1 AND entry_hash = ?2",
            params![file_path, entry_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record an emitted entry in the dedup set.
    pub fn record_synced(&self, file_path: &str, entry_hash: &str, span_id: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO synced_entries
             (file_path, entry_hash, span_id, synced_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![file_path, entry_hash, span_id, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Clear the dedup set for a file. Used on compaction recovery.
    pub fn clear_file_messages(&self, file_path: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM synced_entries WHERE file_path = ?1",
            params![file_path],
        )?;
        Ok(())
    }

    /// Append a diagnostic record to the error log.
    pub fn record_error(&self, file_path: &str, message: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO sync_errors (file_path, error_message, occurred_at)
             VALUES (?1, ?2, ?3)",
            params![file_path, message, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Database statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock();
        let tracked_files: i64 =
            conn.query_row("SELECT COUNT(*) FROM sync_state", [], |row| row.get(0))?;
        let synced_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM synced_entries", [], |row| row.get(0))?;
        let total_entries: i64 = conn.query_row(
            "SELECT COALESCE(SUM(entry_count), 0) FROM sync_state",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            tracked_files: tracked_files.unsigned_abs(),
            synced_entries: synced_entries.unsigned_abs(),
            total_entries: total_entries.unsigned_abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SyncStore {
        SyncStore::open(&dir.path().join("sync.db")).unwrap()
    }

    fn state(path: &str) -> SyncState {
        SyncState {
            file_path: path.to_string(),
            last_offset: 512,
            last_size: 512,
            last_mtime: 1_700_000_000,
            trace_id: Some("sess-1".to_string()),
            entry_count: 4,
            last_sync_at: 1_700_000_100,
            backend: "console".to_string(),
        }
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("sync.db");
        SyncStore::open(&nested).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.db");
        drop(SyncStore::open(&path).unwrap());
        drop(SyncStore::open(&path).unwrap());
    }

    #[test]
    fn state_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert!(store.get_state("/p/a.jsonl").unwrap().is_none());
        let s = state("/p/a.jsonl");
        store.save_state(&s).unwrap();
        assert_eq!(store.get_state("/p/a.jsonl").unwrap(), Some(s));
    }

    #[test]
    fn absent_trace_id_roundtrips_as_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut s = state("/p/a.jsonl");
        s.trace_id = None;
        store.save_state(&s).unwrap();
        assert_eq!(store.get_state("/p/a.jsonl").unwrap().unwrap().trace_id, None);
    }

    #[test]
    fn save_state_upserts() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut s = state("/p/a.jsonl");
        store.save_state(&s).unwrap();
        s.last_offset = 1024;
        s.entry_count = 9;
        store.save_state(&s).unwrap();

        let loaded = store.get_state("/p/a.jsonl").unwrap().unwrap();
        assert_eq!(loaded.last_offset, 1024);
        assert_eq!(loaded.entry_count, 9);
        assert_eq!(store.stats().unwrap().tracked_files, 1);
    }

    #[test]
    fn delete_state_removes_row() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.save_state(&state("/p/a.jsonl")).unwrap();
        store.delete_state("/p/a.jsonl").unwrap();
        assert!(store.get_state("/p/a.jsonl").unwrap().is_none());
    }

    #[test]
    fn dedup_set_tracks_per_file_hashes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert!(!store.is_synced("/p/a.jsonl", "h1").unwrap());
        store.record_synced("/p/a.jsonl", "h1", "span1").unwrap();
        assert!(store.is_synced("/p/a.jsonl", "h1").unwrap());
        // Same hash for a different file is independent
        assert!(!store.is_synced("/p/b.jsonl", "h1").unwrap());
    }

    #[test]
    fn clear_file_messages_only_touches_one_file() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.record_synced("/p/a.jsonl", "h1", "s1").unwrap();
        store.record_synced("/p/a.jsonl", "h2", "s2").unwrap();
        store.record_synced("/p/b.jsonl", "h1", "s3").unwrap();

        store.clear_file_messages("/p/a.jsonl").unwrap();
        assert!(!store.is_synced("/p/a.jsonl", "h1").unwrap());
        assert!(!store.is_synced("/p/a.jsonl", "h2").unwrap());
        assert!(store.is_synced("/p/b.jsonl", "h1").unwrap());
    }

    #[test]
    fn stats_sums_entry_counts_not_dedup_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut a = state("/p/a.jsonl");
        a.entry_count = 10;
        let mut b = state("/p/b.jsonl");
        b.entry_count = 7;
        store.save_state(&a).unwrap();
        store.save_state(&b).unwrap();
        store.record_synced("/p/a.jsonl", "h1", "s1").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.tracked_files, 2);
        assert_eq!(stats.synced_entries, 1);
        assert_eq!(stats.total_entries, 17);
    }

    #[test]
    fn record_error_appends() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.record_error("/p/a.jsonl", "mapping failed").unwrap();
        store.record_error("/p/a.jsonl", "mapping failed again").unwrap();

        let conn = store.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sync_errors", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn all_states_ordered_by_path() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.save_state(&state("/p/b.jsonl")).unwrap();
        store.save_state(&state("/p/a.jsonl")).unwrap();

        let states = store.all_states().unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].file_path, "/p/a.jsonl");
        assert_eq!(states[1].file_path, "/p/b.jsonl");
    }
}
