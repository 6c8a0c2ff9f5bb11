//! Sync coordinator and worker pool.
//!
//! `sync_all` fans discovered files out to a fixed pool of worker threads
//! over a bounded channel, so no two workers ever process the same file
//! and at most `workers` files are being read at once. Each worker decides
//! a per-file strategy from the stored cursor:
//!
//! ```text
//! [absent] --first sight--> [tracked: offset=N, size=S, mtime=T]
//! [tracked] --grew or touched--> [tracked': offset>=N, size=S', mtime=T']
//! [tracked] --size<S--> [absent] (dedup set cleared, full resync)
//! [tracked] --(S,T) unchanged--> [tracked] (no-op, file not opened)
//! ```
//!
//! A backend failure aborts the file's pass without saving state; the
//! next run re-enters from the original cursor and the dedup set keeps
//! already-sent entries from re-emitting.

use crate::error::{Error, Result};
use crate::jsonl::EntryParser;
use crate::storage::{StoreStats, SyncState, SyncStore};
use crate::sync::discover::discover_files;
use crate::sync::hash;
use crate::sync::mapper::SpanMapper;
use crate::sync::span::{Backend, SyncContext};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options for constructing a [`Syncer`].
pub struct SyncerOptions {
    /// Path to the sync state database. Unused in dry-run mode.
    pub db_path: PathBuf,
    /// Sink for exported spans.
    pub backend: Arc<dyn Backend>,
    /// Root directory for discovery.
    pub projects_dir: PathBuf,
    /// Worker pool size; non-positive values coerce to the default.
    pub workers: usize,
    /// When true, no store is opened and nothing is persisted.
    pub dry_run: bool,
}

/// Aggregated result of a sync pass.
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Files considered by discovery.
    pub files_scanned: usize,
    /// Files that emitted at least one span.
    pub files_updated: usize,
    /// Spans emitted across all files, including files that later failed.
    pub spans_synced: usize,
    /// Per-file errors. These do not fail the pass.
    pub errors: Vec<(PathBuf, Error)>,
    /// Wall-clock duration of the pass.
    pub duration: Duration,
}

/// Outcome of one file's pass, carried over the result channel.
struct FileOutcome {
    path: PathBuf,
    spans: usize,
    updated: bool,
    error: Option<Error>,
}

/// Coordinates discovery, the worker pool, mapping, emission, and state.
pub struct Syncer {
    store: Option<SyncStore>,
    backend: Arc<dyn Backend>,
    projects_dir: PathBuf,
    workers: usize,
    dry_run: bool,
}

impl Syncer {
    /// Create a syncer, opening the state store unless in dry-run mode.
    ///
    /// Store-open failure is a top-level error: no sync occurs.
    pub fn new(opts: SyncerOptions) -> Result<Self> {
        let store = if opts.dry_run {
            None
        } else {
            Some(SyncStore::open(&opts.db_path)?)
        };

        Ok(Self {
            store,
            backend: opts.backend,
            projects_dir: opts.projects_dir,
            workers: if opts.workers == 0 {
                crate::config::DEFAULT_WORKERS
            } else {
                opts.workers
            },
            dry_run: opts.dry_run,
        })
    }

    /// Release backend resources.
    pub fn close(&self) -> Result<()> {
        self.backend.close()
    }

    /// Sync database statistics (empty in dry-run mode).
    pub fn stats(&self) -> Result<StoreStats> {
        match &self.store {
            Some(store) => store.stats(),
            None => Ok(StoreStats::default()),
        }
    }

    /// Sync every conversation file under the projects root.
    pub fn sync_all(&self, ctx: &SyncContext) -> Result<SyncResult> {
        let start = Instant::now();
        let files = discover_files(&self.projects_dir)?;

        let mut result = SyncResult {
            files_scanned: files.len(),
            ..SyncResult::default()
        };
        if files.is_empty() {
            result.duration = start.elapsed();
            return Ok(result);
        }

        let pool_size = self.workers.min(files.len());
        let (work_tx, work_rx) = crossbeam_channel::bounded::<PathBuf>(pool_size);
        let (out_tx, out_rx) = crossbeam_channel::unbounded::<FileOutcome>();

        std::thread::scope(|s| {
            for _ in 0..pool_size {
                let work_rx = work_rx.clone();
                let out_tx = out_tx.clone();
                s.spawn(move || {
                    while let Ok(path) = work_rx.recv() {
                        let outcome = self.sync_one(ctx, &path);
                        if out_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            drop(out_tx);

            for path in files {
                if ctx.is_cancelled() || work_tx.send(path).is_err() {
                    break;
                }
            }
            drop(work_tx);

            for outcome in out_rx {
                result.spans_synced += outcome.spans;
                if outcome.updated {
                    result.files_updated += 1;
                }
                if let Some(error) = outcome.error {
                    result.errors.push((outcome.path, error));
                }
            }
        });

        result.duration = start.elapsed();
        Ok(result)
    }

    /// Sync a single file, returning the number of spans emitted.
    pub fn sync_file(&self, ctx: &SyncContext, path: &Path) -> Result<usize> {
        let outcome = self.sync_one(ctx, path);
        match outcome.error {
            None => Ok(outcome.spans),
            Some(error) => Err(error),
        }
    }

    fn sync_one(&self, ctx: &SyncContext, path: &Path) -> FileOutcome {
        let mut outcome = FileOutcome {
            path: path.to_path_buf(),
            spans: 0,
            updated: false,
            error: None,
        };
        if let Err(error) = self.sync_path(ctx, path, &mut outcome) {
            outcome.error = Some(error);
        }
        outcome
    }

    /// Per-file pass: strategy decision, streaming, emission, state update.
    ///
    /// Counters accumulate on `outcome` so partial progress survives an
    /// abort; the error itself is attached by the caller.
    fn sync_path(&self, ctx: &SyncContext, path: &Path, outcome: &mut FileOutcome) -> Result<()> {
        let file_key = path.to_string_lossy().to_string();

        let meta = std::fs::metadata(path)?;
        let current_size = meta.len();
        let current_mtime = mtime_unix(&meta);

        let state = match &self.store {
            Some(store) => store.get_state(&file_key)?,
            None => None,
        };

        let (start_offset, start_count, prior_trace) = match state {
            None => (0, 0, None),
            Some(state) if current_size < state.last_size => {
                // Compaction or rewrite: the dedup set and the state row
                // must both be gone before any new emission for this file.
                tracing::debug!(
                    path = %path.display(),
                    stored = state.last_size,
                    current = current_size,
                    "compaction detected, full resync"
                );
                if let Some(store) = &self.store {
                    store.clear_file_messages(&file_key)?;
                    store.delete_state(&file_key)?;
                }
                (0, 0, None)
            }
            Some(state)
                if current_size == state.last_size && current_mtime == state.last_mtime =>
            {
                tracing::debug!(path = %path.display(), "unchanged, skipping");
                return Ok(());
            }
            Some(state) => (state.last_offset, state.entry_count, state.trace_id),
        };

        let mut parser = EntryParser::open_at(path, start_offset)?;
        let mapper = SpanMapper::new(file_key.clone());
        let mut entry_count = start_count;
        let mut trace_id = prior_trace;

        while let Some(entry) = parser.next()? {
            if ctx.is_cancelled() {
                return Ok(());
            }
            entry_count += 1;

            if trace_id.is_none() && !entry.session_id.is_empty() {
                trace_id = Some(entry.session_id.clone());
            }

            let span = match mapper.map(&entry, entry_count) {
                Ok(Some(span)) => span,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = entry_count,
                        error = %err,
                        "entry mapping failed, skipping"
                    );
                    if let Some(store) = &self.store {
                        store.record_error(&file_key, &err.to_string())?;
                    }
                    continue;
                }
            };

            let entry_hash = hash::entry_hash(&entry);
            if let Some(store) = &self.store {
                if store.is_synced(&file_key, &entry_hash)? {
                    continue;
                }
            }

            self.backend.send_span(ctx, &span)?;

            if let Some(store) = &self.store {
                store.record_synced(&file_key, &entry_hash, &span.id)?;
            }
            outcome.spans += 1;
            outcome.updated = true;
        }

        if ctx.is_cancelled() {
            return Ok(());
        }

        if let Some(store) = &self.store {
            store.save_state(&SyncState {
                file_path: file_key,
                last_offset: parser.offset(),
                last_size: current_size,
                last_mtime: current_mtime,
                trace_id,
                entry_count,
                last_sync_at: Utc::now().timestamp(),
                backend: self.backend.name().to_string(),
            })?;
        }

        Ok(())
    }
}

fn mtime_unix(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
