//! Entry-to-span mapping.

use crate::error::Result;
use crate::jsonl::{self, EntryType, RawEntry};
use crate::sync::hash;
use crate::sync::span::{Span, SpanKind};
use chrono::{DateTime, Utc};

/// Converts transcript entries to spans for one file.
///
/// Pure aside from the filename: mapping the same entry at the same line
/// twice yields byte-identical spans.
pub struct SpanMapper {
    file_path: String,
}

impl SpanMapper {
    #[must_use]
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Map an entry to a span, or `None` for entry types that do not
    /// export (file-history snapshots, queue operations, unknowns).
    ///
    /// Fails only when a message-bearing payload cannot be decoded at all;
    /// the caller logs and skips such entries.
    pub fn map(&self, entry: &RawEntry, line: u64) -> Result<Option<Span>> {
        match entry.entry_type {
            EntryType::User => self.map_user_message(entry, line).map(Some),
            EntryType::Assistant => self.map_assistant_message(entry, line).map(Some),
            EntryType::System => self.map_system_message(entry, line).map(Some),
            EntryType::Summary => Ok(Some(self.map_summary(entry, line))),
            EntryType::FileHistorySnapshot
            | EntryType::QueueOperation
            | EntryType::Other(_) => Ok(None),
        }
    }

    fn map_user_message(&self, entry: &RawEntry, line: u64) -> Result<Span> {
        let msg = entry.parse_message()?;

        let mut span = self.base_span(entry, line, SpanKind::Span, "user-message");
        if let Some(msg) = &msg {
            span.input = jsonl::extract_text(msg);
        }
        span.metadata
            .insert("uuid".into(), entry.uuid.clone().into());
        span.metadata
            .insert("parent_uuid".into(), entry.parent_uuid.clone().into());
        Ok(span)
    }

    fn map_assistant_message(&self, entry: &RawEntry, line: u64) -> Result<Span> {
        let msg = entry.parse_message()?;

        let mut span = self.base_span(entry, line, SpanKind::Generation, "assistant-generation");
        if let Some(msg) = &msg {
            span.output = jsonl::extract_text(msg);
            span.model = msg.model.clone();

            let thinking = jsonl::extract_thinking(msg);
            if !thinking.is_empty() {
                span.metadata.insert("thinking".into(), thinking.into());
            }
            let tools = jsonl::extract_tool_calls(msg);
            if !tools.is_empty() {
                span.metadata.insert("tool_calls".into(), tools.into());
            }
        }
        if !entry.uuid.is_empty() {
            span.metadata
                .insert("uuid".into(), entry.uuid.clone().into());
        }
        Ok(span)
    }

    fn map_system_message(&self, entry: &RawEntry, line: u64) -> Result<Span> {
        let msg = entry.parse_message()?;

        let mut span = self.base_span(entry, line, SpanKind::Span, "system-message");
        if let Some(msg) = &msg {
            span.input = jsonl::extract_text(msg);
        }
        Ok(span)
    }

    fn map_summary(&self, entry: &RawEntry, line: u64) -> Span {
        let mut span = self.base_span(entry, line, SpanKind::Span, "context-summary");
        span.output = entry.summary.clone();
        span
    }

    fn base_span(&self, entry: &RawEntry, line: u64, kind: SpanKind, name: &str) -> Span {
        let timestamp = parse_timestamp(&entry.timestamp);
        let mut span = Span::new(
            hash::span_id(entry, &self.file_path, line),
            entry.session_id.clone(),
            kind,
            name,
        );
        span.start_time = timestamp;
        span.end_time = timestamp;
        span.source_file = self.file_path.clone();
        span.source_line = line;
        span
    }
}

/// Parse an RFC 3339 timestamp (sub-second precision included), falling
/// back to the current wall clock when absent or unparseable.
fn parse_timestamp(ts: &str) -> DateTime<Utc> {
    if ts.is_empty() {
        return Utc::now();
    }
    DateTime::parse_from_rfc3339(ts)
        .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(line: &str) -> RawEntry {
        serde_json::from_str(line).unwrap()
    }

    fn mapper() -> SpanMapper {
        SpanMapper::new("/p/abc.jsonl")
    }

    #[test]
    fn user_message_maps_to_span_with_input() {
        let e = entry(
            r#"{"type":"user","uuid":"u1","parentUuid":"p1","sessionId":"S1",
                "timestamp":"2025-06-01T10:00:00Z",
                "message":{"role":"user","content":"hello"}}"#,
        );
        let span = mapper().map(&e, 1).unwrap().unwrap();
        assert_eq!(span.kind, SpanKind::Span);
        assert_eq!(span.name, "user-message");
        assert_eq!(span.id, "u1");
        assert_eq!(span.trace_id, "S1");
        assert_eq!(span.input, "hello");
        assert_eq!(span.metadata["uuid"], "u1");
        assert_eq!(span.metadata["parent_uuid"], "p1");
        assert_eq!(span.source_line, 1);
        assert_eq!(
            span.start_time,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(span.start_time, span.end_time);
    }

    #[test]
    fn assistant_message_maps_to_generation() {
        let e = entry(
            r#"{"type":"assistant","uuid":"a1","sessionId":"S1",
                "message":{"role":"assistant","model":"claude-sonnet-4","content":[
                    {"type":"thinking","thinking":"pondering"},
                    {"type":"text","text":"the answer"},
                    {"type":"tool_use","id":"t1","name":"Read","input":{}}
                ]}}"#,
        );
        let span = mapper().map(&e, 2).unwrap().unwrap();
        assert_eq!(span.kind, SpanKind::Generation);
        assert_eq!(span.name, "assistant-generation");
        assert_eq!(span.output, "the answer");
        assert_eq!(span.model.as_deref(), Some("claude-sonnet-4"));
        assert_eq!(span.metadata["thinking"], "pondering");
        assert_eq!(span.metadata["tool_calls"][0], "Read");
    }

    #[test]
    fn system_message_maps_to_span() {
        let e = entry(
            r#"{"type":"system","message":{"role":"system","content":"be brief"}}"#,
        );
        let span = mapper().map(&e, 1).unwrap().unwrap();
        assert_eq!(span.name, "system-message");
        assert_eq!(span.input, "be brief");
    }

    #[test]
    fn summary_maps_with_summary_output() {
        let e = entry(r#"{"type":"summary","sessionId":"S1","summary":"we fixed the bug"}"#);
        let span = mapper().map(&e, 5).unwrap().unwrap();
        assert_eq!(span.name, "context-summary");
        assert_eq!(span.output, "we fixed the bug");
    }

    #[test]
    fn non_exporting_types_return_none() {
        for line in [
            r#"{"type":"file-history-snapshot"}"#,
            r#"{"type":"queue-operation"}"#,
            r#"{"type":"brand-new-type"}"#,
        ] {
            assert!(mapper().map(&entry(line), 1).unwrap().is_none());
        }
    }

    #[test]
    fn mapping_is_deterministic() {
        let e = entry(
            r#"{"type":"user","sessionId":"S1","timestamp":"2025-06-01T10:00:00.123Z",
                "message":{"role":"user","content":"same"}}"#,
        );
        let a = mapper().map(&e, 3).unwrap().unwrap();
        let b = mapper().map(&e, 3).unwrap().unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn subsecond_timestamps_parse() {
        let e = entry(
            r#"{"type":"user","timestamp":"2025-06-01T10:00:00.123456Z",
                "message":{"role":"user","content":"x"}}"#,
        );
        let span = mapper().map(&e, 1).unwrap().unwrap();
        assert_eq!(span.start_time.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn missing_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let e = entry(r#"{"type":"user","message":{"role":"user","content":"x"}}"#);
        let span = mapper().map(&e, 1).unwrap().unwrap();
        assert!(span.start_time >= before);
    }

    #[test]
    fn string_payload_extracts_as_text() {
        let e = entry(r#"{"type":"user","message":{"role":"user","content":"bare string"}}"#);
        let span = mapper().map(&e, 1).unwrap().unwrap();
        assert_eq!(span.input, "bare string");
    }

    #[test]
    fn payload_that_is_not_an_object_errors() {
        let e = entry(r#"{"type":"user","message":[1,2,3]}"#);
        assert!(mapper().map(&e, 1).is_err());
    }
}
