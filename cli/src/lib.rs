//! TraceUp - ship Claude Code conversation history to observability backends
//!
//! This crate provides the core functionality for the `traceup` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`jsonl`] - Streaming parser for conversation transcript files
//! - [`sync`] - Incremental sync engine (mapper, discovery, coordinator)
//! - [`backend`] - Pluggable span sinks (console is in-tree)
//! - [`storage`] - SQLite sync-state layer (cursors, dedup, error log)
//! - [`config`] - Configuration management
//! - [`paths`] - Claude projects-directory conventions
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod jsonl;
pub mod paths;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
