//! Database schema definitions.

/// The complete SQL schema for the sync-state database.
///
/// Creation is idempotent so every open can apply it. Timestamps are
/// stored as INTEGER Unix seconds.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Per-file sync state
-- ====================

CREATE TABLE IF NOT EXISTS sync_state (
    file_path TEXT PRIMARY KEY,
    last_offset INTEGER NOT NULL,
    last_size INTEGER NOT NULL,
    last_mtime INTEGER NOT NULL,
    trace_id TEXT,
    entry_count INTEGER NOT NULL DEFAULT 0,
    last_sync_at INTEGER NOT NULL,
    backend TEXT NOT NULL
);

-- ====================
-- Per-entry dedup set
-- ====================

CREATE TABLE IF NOT EXISTS synced_entries (
    file_path TEXT NOT NULL,
    entry_hash TEXT NOT NULL,
    span_id TEXT NOT NULL,
    synced_at INTEGER NOT NULL,
    PRIMARY KEY (file_path, entry_hash)
);

CREATE INDEX IF NOT EXISTS idx_synced_entries_file
    ON synced_entries(file_path);

-- ====================
-- Error log (append-only, no read path in the engine)
-- ====================

CREATE TABLE IF NOT EXISTS sync_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT NOT NULL,
    error_message TEXT NOT NULL,
    occurred_at INTEGER NOT NULL
);
";
