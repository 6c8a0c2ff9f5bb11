//! Parsing for Claude Code JSONL conversation transcripts.
//!
//! Transcript files hold one JSON object per line. Scanning thousands of
//! files where only metadata is needed must not pay the cost of parsing
//! every payload, so parsing happens in two stages:
//!
//! 1. [`EntryParser`] streams lines into [`RawEntry`] values, keeping the
//!    `message` payload as uninterpreted bytes.
//! 2. [`RawEntry::parse_message`] decodes the payload into a [`Message`]
//!    with typed content blocks, on demand.
//!
//! # Submodules
//!
//! - [`types`] - Raw entry, message, and content block types
//! - [`parser`] - Streaming line reader with byte-offset tracking
//! - [`content`] - Text/thinking/tool extraction from parsed messages

pub mod content;
pub mod parser;
pub mod types;

pub use content::{extract_text, extract_thinking, extract_tool_calls};
pub use parser::{EntryParser, MAX_LINE_BYTES};
pub use types::{ContentBlock, EntryType, Message, RawEntry};
