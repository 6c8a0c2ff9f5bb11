//! Sync command implementation.
//!
//! Per-file errors are reported on stderr but do not fail the run: the
//! exit code stays zero whenever aggregation itself succeeded. Only
//! discovery failure and store-open failure are fatal here.

use crate::backend::create_backend;
use crate::cli::{Cli, SyncArgs, SyncCommands};
use crate::config::Config;
use crate::error::Result;
use crate::storage::SyncStore;
use crate::sync::{SyncContext, SyncResult, Syncer, SyncerOptions};
use colored::Colorize;

/// Execute `traceup sync` and its subcommands.
pub fn execute(cli: &Cli, args: &SyncArgs) -> Result<()> {
    let config = resolve_config(cli, args);

    match &args.command {
        Some(SyncCommands::Status) => status(&config, cli.json),
        None => run_sync(cli, args, &config),
    }
}

/// Merge CLI flags over environment and defaults.
fn resolve_config(cli: &Cli, args: &SyncArgs) -> Config {
    let mut config = Config::load();

    if let Some(db) = &cli.db {
        config.db_path.clone_from(db);
    }
    if let Some(dir) = &cli.projects_dir {
        config.projects_dir.clone_from(dir);
    }
    if let Some(backend) = &args.backend {
        config.backend.clone_from(backend);
    }
    config.set_workers(args.workers);
    config.dry_run = config.dry_run || args.dry_run;
    config.console.verbose = config.console.verbose || args.verbose_spans;
    if cli.json {
        config.console.format = "json".to_string();
    }
    config.console.no_color = config.console.no_color || cli.no_color;

    config
}

fn run_sync(cli: &Cli, args: &SyncArgs, config: &Config) -> Result<()> {
    let backend = create_backend(&config.backend, config)?;
    let syncer = Syncer::new(SyncerOptions {
        db_path: config.db_path.clone(),
        backend,
        projects_dir: config.projects_dir.clone(),
        workers: config.workers,
        dry_run: config.dry_run,
    })?;

    let ctx = SyncContext::new();
    let result = match &args.file {
        Some(path) => {
            let mut result = SyncResult {
                files_scanned: 1,
                ..SyncResult::default()
            };
            match syncer.sync_file(&ctx, path) {
                Ok(spans) => {
                    result.spans_synced = spans;
                    result.files_updated = usize::from(spans > 0);
                }
                Err(err) => result.errors.push((path.clone(), err)),
            }
            result
        }
        None => syncer.sync_all(&ctx)?,
    };
    syncer.close()?;

    if cli.json {
        print_json_summary(&result, config.dry_run)?;
    } else if !cli.quiet {
        print_summary(&result, config.dry_run, cli.no_color);
    }

    if !result.errors.is_empty() && !cli.json {
        eprintln!();
        eprintln!("{}", dim("Errors:", cli.no_color));
        for (path, error) in &result.errors {
            eprintln!("  {}: {error}", path.display());
        }
    }

    Ok(())
}

fn print_summary(result: &SyncResult, dry_run: bool, no_color: bool) {
    let prefix = if dry_run { "[DRY RUN] " } else { "" };

    println!();
    println!("{prefix}{}", dim("Sync Summary", no_color));
    println!("  Files scanned: {}", result.files_scanned);
    println!("  Files updated: {}", result.files_updated);
    println!("  Spans synced:  {}", result.spans_synced);
    println!("  Duration:      {:.3}s", result.duration.as_secs_f64());
}

fn print_json_summary(result: &SyncResult, dry_run: bool) -> Result<()> {
    let errors: Vec<serde_json::Value> = result
        .errors
        .iter()
        .map(|(path, error)| {
            serde_json::json!({
                "file": path.display().to_string(),
                "message": error.to_string(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "dry_run": dry_run,
        "files_scanned": result.files_scanned,
        "files_updated": result.files_updated,
        "spans_synced": result.spans_synced,
        "duration_ms": u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
        "errors": errors,
    });
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn status(config: &Config, json: bool) -> Result<()> {
    let store = SyncStore::open(&config.db_path)?;
    let stats = store.stats()?;

    if json {
        let output = serde_json::json!({
            "database": config.db_path.display().to_string(),
            "backend": config.backend,
            "tracked_files": stats.tracked_files,
            "synced_entries": stats.synced_entries,
            "total_entries": stats.total_entries,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", dim("Sync Status", config.console.no_color));
        println!("  Database:       {}", config.db_path.display());
        println!("  Backend:        {}", config.backend);
        println!("  Tracked files:  {}", stats.tracked_files);
        println!("  Synced entries: {}", stats.synced_entries);
        println!("  Total entries:  {}", stats.total_entries);
    }

    Ok(())
}

fn dim(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        s.dimmed().to_string()
    }
}
