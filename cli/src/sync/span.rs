//! Span model and the pluggable backend contract.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The kind of a telemetry span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// Root span for a conversation.
    Trace,
    /// LLM generation (assistant message).
    Generation,
    /// User message, system message, tool call, etc.
    Span,
}

impl SpanKind {
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Trace => "trace",
            Self::Generation => "generation",
            Self::Span => "span",
        }
    }
}

/// A telemetry span ready for export.
///
/// Identifiers are deterministic in the inputs: re-running the mapper on
/// an unchanged entry yields a byte-identical span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Unique span ID: the entry UUID, or a hash of (path, line,
    /// timestamp, payload) when the entry has none.
    pub id: String,

    /// Trace ID (the conversation session id, possibly empty).
    pub trace_id: String,

    /// Parent span ID for nested spans.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_id: String,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    pub kind: SpanKind,

    /// Human-readable name, e.g. "user-message".
    pub name: String,

    /// User message or tool input.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input: String,

    /// Assistant response or tool output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    /// Freeform metadata. Ordered so serialisation is reproducible.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,

    // LLM-specific (generation spans)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,

    // Tool-specific
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_result: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    /// Originating JSONL file.
    pub source_file: String,
    /// 1-based line number within that file.
    pub source_line: u64,
}

impl Span {
    /// A span skeleton with the given identity and classification; content
    /// fields start empty for the mapper to fill in.
    #[must_use]
    pub fn new(id: String, trace_id: String, kind: SpanKind, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            trace_id,
            parent_id: String::new(),
            start_time: now,
            end_time: now,
            kind,
            name: name.to_string(),
            input: String::new(),
            output: String::new(),
            metadata: BTreeMap::new(),
            model: None,
            tokens_in: None,
            tokens_out: None,
            is_streaming: false,
            tool_name: String::new(),
            tool_result: String::new(),
            is_error: false,
            source_file: String::new(),
            source_line: 0,
        }
    }
}

/// A batch of spans bound for a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanBatch {
    pub trace_id: String,
    pub session_id: String,
    pub project: String,
    pub spans: Vec<Span>,
    pub created_at: DateTime<Utc>,
}

/// Cancellation token threaded from the coordinator to backends.
///
/// Workers complete their in-flight entry emission, then exit at the next
/// loop boundary; partial state is not persisted.
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    cancel: Arc<AtomicBool>,
}

impl SyncContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the current sync pass.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// True once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// A sync backend: the sink spans are exported to.
///
/// `send_span` may be synchronous or buffered; buffered implementations
/// must drain on `flush`. Errors surface to the coordinator and abort the
/// current file's pass without affecting other files. Implementations must
/// tolerate concurrent `send_span` calls from multiple workers.
pub trait Backend: Send + Sync {
    /// Backend identifier, recorded in the sync state.
    fn name(&self) -> &str;

    /// Send a single span.
    fn send_span(&self, ctx: &SyncContext, span: &Span) -> Result<()>;

    /// Send a batch of spans. The default delegates to `send_span` per
    /// element.
    fn send_batch(&self, ctx: &SyncContext, batch: &SpanBatch) -> Result<()> {
        for span in &batch.spans {
            self.send_span(ctx, span)?;
        }
        Ok(())
    }

    /// Ensure all pending spans are sent.
    fn flush(&self, ctx: &SyncContext) -> Result<()>;

    /// Release resources. Must be idempotent.
    fn close(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_kind_wire_strings() {
        assert_eq!(SpanKind::Trace.as_str(), "trace");
        assert_eq!(SpanKind::Generation.as_str(), "generation");
        assert_eq!(SpanKind::Span.as_str(), "span");
    }

    #[test]
    fn span_serialisation_skips_empty_fields() {
        let mut span = Span::new("id1".into(), "t1".into(), SpanKind::Span, "user-message");
        span.source_file = "/p/a.jsonl".into();
        span.source_line = 1;

        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["id"], "id1");
        assert_eq!(json["kind"], "span");
        assert!(json.get("parent_id").is_none());
        assert!(json.get("input").is_none());
        assert!(json.get("model").is_none());
        assert!(json.get("is_streaming").is_none());
    }

    #[test]
    fn cancellation_is_shared_across_clones() {
        let ctx = SyncContext::new();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
