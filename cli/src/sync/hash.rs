//! Deterministic span-id and dedup-hash derivation.
//!
//! Both hashes feed resumability guarantees, so their inputs are the exact
//! on-disk payload bytes: re-serialising would let formatting differences
//! change identities across runs.

use crate::jsonl::RawEntry;
use sha2::{Digest, Sha256};

/// Span identifier for an entry.
///
/// The entry's UUID verbatim when present; otherwise the first 16 hex
/// characters of SHA-256 over (file path, line number, timestamp, payload).
#[must_use]
pub fn span_id(entry: &RawEntry, file_path: &str, line: u64) -> String {
    if !entry.uuid.is_empty() {
        return entry.uuid.clone();
    }

    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(line.to_string().as_bytes());
    hasher.update(entry.timestamp.as_bytes());
    hasher.update(entry.message_bytes());
    let digest = hex(&hasher.finalize());
    digest[..16].to_string()
}

/// Content hash for the per-file dedup set.
///
/// SHA-256 over (discriminant, session id, timestamp, entry UUID, payload
/// bytes), truncated to 32 hex characters (128 bits).
#[must_use]
pub fn entry_hash(entry: &RawEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.entry_type.as_str().as_bytes());
    hasher.update(entry.session_id.as_bytes());
    hasher.update(entry.timestamp.as_bytes());
    hasher.update(entry.uuid.as_bytes());
    hasher.update(entry.message_bytes());
    let digest = hex(&hasher.finalize());
    digest[..32].to_string()
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: &str) -> RawEntry {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn span_id_uses_uuid_verbatim() {
        let e = entry(r#"{"type":"user","uuid":"9dbf1107-d255-4d17"}"#);
        assert_eq!(span_id(&e, "/p/a.jsonl", 1), "9dbf1107-d255-4d17");
    }

    #[test]
    fn span_id_hashes_without_uuid() {
        let e = entry(r#"{"type":"user","timestamp":"2025-01-01T00:00:00Z"}"#);
        let id = span_id(&e, "/p/a.jsonl", 1);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn span_id_is_deterministic() {
        let e = entry(r#"{"type":"user","message":{"role":"user","content":"hi"}}"#);
        assert_eq!(span_id(&e, "/p/a.jsonl", 3), span_id(&e, "/p/a.jsonl", 3));
    }

    #[test]
    fn span_id_varies_with_inputs() {
        let e = entry(r#"{"type":"user","message":{"role":"user","content":"hi"}}"#);
        assert_ne!(span_id(&e, "/p/a.jsonl", 1), span_id(&e, "/p/a.jsonl", 2));
        assert_ne!(span_id(&e, "/p/a.jsonl", 1), span_id(&e, "/p/b.jsonl", 1));
    }

    #[test]
    fn entry_hash_is_32_hex_chars() {
        let e = entry(r#"{"type":"user","sessionId":"s1","uuid":"u1"}"#);
        let h = entry_hash(&e);
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn entry_hash_is_deterministic_and_content_sensitive() {
        let a = entry(r#"{"type":"user","sessionId":"s1","message":{"role":"user","content":"one"}}"#);
        let b = entry(r#"{"type":"user","sessionId":"s1","message":{"role":"user","content":"two"}}"#);
        assert_eq!(entry_hash(&a), entry_hash(&a));
        assert_ne!(entry_hash(&a), entry_hash(&b));
    }

    #[test]
    fn entry_hash_distinguishes_discriminants() {
        let a = entry(r#"{"type":"user","sessionId":"s1"}"#);
        let b = entry(r#"{"type":"system","sessionId":"s1"}"#);
        assert_ne!(entry_hash(&a), entry_hash(&b));
    }
}
