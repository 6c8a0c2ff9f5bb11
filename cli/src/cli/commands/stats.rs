//! Stats command: sync-state database statistics with per-file rows.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::storage::SyncStore;
use chrono::{DateTime, Utc};
use colored::Colorize;

/// Execute `traceup stats`.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut config = Config::load();
    if let Some(db) = &cli.db {
        config.db_path.clone_from(db);
    }

    let store = SyncStore::open(&config.db_path)?;
    let stats = store.stats()?;
    let states = store.all_states()?;

    if cli.json {
        let files: Vec<serde_json::Value> = states
            .iter()
            .map(|s| {
                serde_json::json!({
                    "file": s.file_path,
                    "offset": s.last_offset,
                    "entries": s.entry_count,
                    "trace_id": s.trace_id,
                    "backend": s.backend,
                    "last_sync_at": s.last_sync_at,
                })
            })
            .collect();
        let output = serde_json::json!({
            "database": config.db_path.display().to_string(),
            "tracked_files": stats.tracked_files,
            "synced_entries": stats.synced_entries,
            "total_entries": stats.total_entries,
            "files": files,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    let dim = |s: &str| {
        if cli.no_color {
            s.to_string()
        } else {
            s.dimmed().to_string()
        }
    };

    println!("{}", dim("Sync Statistics"));
    println!("  Database:       {}", config.db_path.display());
    println!("  Tracked files:  {}", stats.tracked_files);
    println!("  Synced entries: {}", stats.synced_entries);
    println!("  Total entries:  {}", stats.total_entries);

    if !states.is_empty() {
        println!();
        println!("{}", dim("Tracked Files"));
        for state in &states {
            let trace = state
                .trace_id
                .as_deref()
                .map_or("-", paths::short_id);
            let synced_at = DateTime::<Utc>::from_timestamp(state.last_sync_at, 0)
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
            println!(
                "  {}  {} entries  trace {}  {} @ {}",
                state.file_path, state.entry_count, trace, state.backend, synced_at,
            );
        }
    }

    Ok(())
}
