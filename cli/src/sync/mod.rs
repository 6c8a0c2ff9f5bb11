//! Incremental sync engine.
//!
//! Ships conversation transcripts to an observability backend as telemetry
//! spans, resuming each file from its last committed byte offset:
//!
//! 1. **Discovery** enumerates candidate JSONL files under the projects root.
//! 2. The **coordinator** fans files out to a bounded worker pool; per file
//!    it decides a strategy (skip / incremental / full resync) from the
//!    stored cursor and the file's current size and mtime.
//! 3. The **mapper** converts each new entry into zero-or-one spans with
//!    deterministic identifiers.
//! 4. The **dedup set** suppresses re-emission when a file is re-read from
//!    an earlier offset.
//!
//! # Submodules
//!
//! - [`span`] - Span model, batches, the backend contract, cancellation
//! - [`hash`] - Span-id and dedup-hash derivation
//! - [`mapper`] - Entry-to-span mapping
//! - [`discover`] - Conversation file discovery
//! - [`syncer`] - Coordinator and worker pool

pub mod discover;
pub mod hash;
pub mod mapper;
pub mod span;
pub mod syncer;

pub use discover::discover_files;
pub use mapper::SpanMapper;
pub use span::{Backend, Span, SpanBatch, SpanKind, SyncContext};
pub use syncer::{SyncResult, Syncer, SyncerOptions};
