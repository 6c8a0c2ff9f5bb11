//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// TraceUp - ship Claude Code conversation history to observability backends
#[derive(Parser, Debug)]
#[command(name = "traceup", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sync database path (default: ~/.traceup/sync.db)
    #[arg(long, global = true, env = "TRACEUP_DB")]
    pub db: Option<PathBuf>,

    /// Claude projects directory (default: ~/.claude/projects)
    #[arg(long, global = true, env = "CLAUDE_PROJECTS_DIR")]
    pub projects_dir: Option<PathBuf>,

    /// Output as JSON (for agent integration)
    #[arg(long, alias = "robot", global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync conversations to an observability backend
    Sync(SyncArgs),

    /// Show sync-state database statistics
    Stats,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: Option<SyncCommands>,

    /// Show what would be synced without persisting
    #[arg(long)]
    pub dry_run: bool,

    /// Sync a specific file instead of the whole projects tree
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Backend selector (default: console)
    #[arg(long, env = "TRACEUP_BACKEND")]
    pub backend: Option<String>,

    /// Worker pool size; non-positive values fall back to 4
    #[arg(long, env = "TRACEUP_WORKERS", allow_hyphen_values = true)]
    pub workers: Option<i64>,

    /// Show detailed span information
    #[arg(long)]
    pub verbose_spans: bool,
}

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Show sync status
    Status,
}
