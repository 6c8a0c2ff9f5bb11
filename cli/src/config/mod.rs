//! Configuration management.
//!
//! Resolution order for every setting: CLI flag, then environment variable,
//! then built-in default. Defaults put the sync-state database under
//! `~/.traceup/` while conversation input comes from Claude Code's own
//! `~/.claude/projects/` tree.
//!
//! Recognised environment variables:
//! - `CLAUDE_PROJECTS_DIR` - root directory for discovery
//! - `TRACEUP_DB` - path to the sync state database
//! - `TRACEUP_BACKEND` - backend selector ("console")
//! - `TRACEUP_WORKERS` - worker pool size

use crate::paths;
use std::path::PathBuf;

/// Default worker pool size for the sync coordinator.
pub const DEFAULT_WORKERS: usize = 4;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory containing Claude project history.
    pub projects_dir: PathBuf,

    /// Path to the sync state database.
    pub db_path: PathBuf,

    /// Backend selector ("console").
    pub backend: String,

    /// Number of parallel sync workers.
    pub workers: usize,

    /// When true, sync shows what would be sent without persisting.
    pub dry_run: bool,

    /// Console backend settings.
    pub console: ConsoleOptions,
}

/// Console backend settings.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Show full span details.
    pub verbose: bool,

    /// Output format: "text" or "json".
    pub format: String,

    /// Disable colored output.
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: paths::default_projects_dir().unwrap_or_default(),
            db_path: default_db_path().unwrap_or_else(|| PathBuf::from("sync.db")),
            backend: "console".to_string(),
            workers: DEFAULT_WORKERS,
            dry_run: false,
            console: ConsoleOptions {
                verbose: false,
                format: "text".to_string(),
                no_color: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment variables.
    ///
    /// CLI flags are applied on top by the command handlers.
    #[must_use]
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(dir) = non_empty_env("CLAUDE_PROJECTS_DIR") {
            cfg.projects_dir = PathBuf::from(dir);
        }
        if let Some(db) = non_empty_env("TRACEUP_DB") {
            cfg.db_path = PathBuf::from(db);
        }
        if let Some(backend) = non_empty_env("TRACEUP_BACKEND") {
            cfg.backend = backend;
        }
        if let Some(workers) = non_empty_env("TRACEUP_WORKERS") {
            cfg.workers = coerce_workers(workers.parse().ok());
        }

        cfg
    }

    /// Apply a worker-count override, coercing invalid values to the default.
    pub fn set_workers(&mut self, workers: Option<i64>) {
        if workers.is_some() {
            self.workers = coerce_workers(workers);
        }
    }
}

/// Get the TraceUp data directory (`~/.traceup`).
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".traceup"))
}

/// Default sync database path (`~/.traceup/sync.db`).
#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("sync.db"))
}

/// Coerce a worker count to a positive value, defaulting to 4.
#[must_use]
pub fn coerce_workers(workers: Option<i64>) -> usize {
    match workers {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_WORKERS),
        _ => DEFAULT_WORKERS,
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = Config::default();
        assert_eq!(cfg.backend, "console");
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.console.format, "text");
    }

    #[test]
    fn coerce_workers_rejects_non_positive() {
        assert_eq!(coerce_workers(Some(0)), DEFAULT_WORKERS);
        assert_eq!(coerce_workers(Some(-3)), DEFAULT_WORKERS);
        assert_eq!(coerce_workers(None), DEFAULT_WORKERS);
        assert_eq!(coerce_workers(Some(8)), 8);
    }

    #[test]
    fn set_workers_ignores_missing_override() {
        let mut cfg = Config::default();
        cfg.workers = 2;
        cfg.set_workers(None);
        assert_eq!(cfg.workers, 2);
        cfg.set_workers(Some(0));
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
        cfg.set_workers(Some(6));
        assert_eq!(cfg.workers, 6);
    }

    #[test]
    fn default_db_path_under_data_dir() {
        if let Some(path) = default_db_path() {
            assert!(path.ends_with(".traceup/sync.db"));
        }
    }
}
