//! Raw entry and message types for transcript lines.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Discriminant of a JSONL entry.
///
/// Unknown discriminants are carried through as [`EntryType::Other`] so a
/// new entry type introduced upstream never aborts parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    User,
    Assistant,
    System,
    Summary,
    FileHistorySnapshot,
    QueueOperation,
    Other(String),
}

impl EntryType {
    /// The wire string for this discriminant.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Summary => "summary",
            Self::FileHistorySnapshot => "file-history-snapshot",
            Self::QueueOperation => "queue-operation",
            Self::Other(s) => s,
        }
    }

    /// True if the entry type represents a conversation message.
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self, Self::User | Self::Assistant | Self::System)
    }
}

impl Default for EntryType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for EntryType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "summary" => Self::Summary,
            "file-history-snapshot" => Self::FileHistorySnapshot,
            "queue-operation" => Self::QueueOperation,
            _ => Self::Other(s),
        }
    }
}

impl From<EntryType> for String {
    fn from(t: EntryType) -> Self {
        t.as_str().to_string()
    }
}

/// One transcript line with minimal parsing.
///
/// The `message` payload is kept as raw bytes for deferred parsing; it also
/// feeds span-id and dedup-hash derivation, which need the exact on-disk
/// bytes rather than a re-serialised form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub timestamp: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,

    #[serde(rename = "parentUuid", skip_serializing_if = "String::is_empty")]
    pub parent_uuid: String,

    #[serde(rename = "sessionId", skip_serializing_if = "String::is_empty")]
    pub session_id: String,

    #[serde(rename = "isSidechain", skip_serializing_if = "std::ops::Not::not")]
    pub is_sidechain: bool,

    #[serde(rename = "agentId", skip_serializing_if = "String::is_empty")]
    pub agent_id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub cwd: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<RawValue>>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

impl RawEntry {
    /// The raw message payload bytes, empty when no payload is present.
    #[must_use]
    pub fn message_bytes(&self) -> &[u8] {
        self.message.as_deref().map_or(b"", |m| m.get().as_bytes())
    }

    /// Parse the message payload into a full [`Message`].
    ///
    /// Returns `Ok(None)` when the entry carries no payload. Fails only on
    /// a payload that is not a JSON object at all; polymorphic content is
    /// absorbed by [`Message`]'s own decoding.
    pub fn parse_message(&self) -> crate::Result<Option<Message>> {
        match &self.message {
            None => Ok(None),
            Some(raw) => {
                let msg: Message = serde_json::from_str(raw.get())?;
                Ok(Some(msg))
            }
        }
    }
}

/// A fully parsed message: role, optional model, ordered content blocks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Message {
    pub role: String,
    pub model: Option<String>,
    pub content: Vec<ContentBlock>,
}

// The on-disk shape of `content` is either a bare string (implicit single
// text block) or an array of tagged blocks. Try string first, then array,
// and fall back to empty content rather than failing.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            #[serde(default)]
            role: String,
            #[serde(default)]
            model: Option<String>,
            #[serde(default)]
            content: serde_json::Value,
        }

        let repr = Repr::deserialize(deserializer)?;
        let content = match repr.content {
            serde_json::Value::String(text) => vec![ContentBlock::Text { text }],
            value @ serde_json::Value::Array(_) => {
                serde_json::from_value(value).unwrap_or_default()
            }
            _ => Vec::new(),
        };

        Ok(Self {
            role: repr.role,
            model: repr.model,
            content,
        })
    }
}

/// A single content block within a message.
///
/// Tool-use `input` and tool-result `content` are opaque JSON of unbounded
/// shape; they stay undecoded until a caller asks for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Option<serde_json::Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: Option<serde_json::Value>,
        #[serde(default)]
        is_error: bool,
    },
    Image {},
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_roundtrips_known_values() {
        for wire in [
            "user",
            "assistant",
            "system",
            "summary",
            "file-history-snapshot",
            "queue-operation",
        ] {
            let t = EntryType::from(wire.to_string());
            assert_eq!(t.as_str(), wire);
            assert!(!matches!(t, EntryType::Other(_)));
        }
    }

    #[test]
    fn entry_type_carries_unknown_values() {
        let t = EntryType::from("shiny-new-thing".to_string());
        assert_eq!(t, EntryType::Other("shiny-new-thing".to_string()));
        assert_eq!(t.as_str(), "shiny-new-thing");
    }

    #[test]
    fn raw_entry_parses_with_unknown_keys() {
        let line = r#"{"type":"user","uuid":"u1","sessionId":"s1","futureKey":42,"message":{"role":"user","content":"hi"}}"#;
        let entry: RawEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.entry_type, EntryType::User);
        assert_eq!(entry.uuid, "u1");
        assert_eq!(entry.session_id, "s1");
        assert!(entry.message.is_some());
    }

    #[test]
    fn message_bytes_preserves_payload_verbatim() {
        let line = r#"{"type":"user","message":{"role":"user","content":"hi","extra":[1,2]}}"#;
        let entry: RawEntry = serde_json::from_str(line).unwrap();
        assert_eq!(
            entry.message_bytes(),
            br#"{"role":"user","content":"hi","extra":[1,2]}"#
        );
    }

    #[test]
    fn message_bytes_empty_without_payload() {
        let entry: RawEntry = serde_json::from_str(r#"{"type":"summary"}"#).unwrap();
        assert!(entry.message_bytes().is_empty());
        assert!(entry.parse_message().unwrap().is_none());
    }

    #[test]
    fn string_content_normalises_to_text_block() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"user","content":"hello there"}"#).unwrap();
        assert_eq!(msg.content.len(), 1);
        assert!(matches!(&msg.content[0], ContentBlock::Text { text } if text == "hello there"));
    }

    #[test]
    fn array_content_parses_tagged_blocks() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"assistant","model":"claude-sonnet-4","content":[
                {"type":"thinking","thinking":"hmm"},
                {"type":"text","text":"answer"},
                {"type":"tool_use","id":"t1","name":"Read","input":{"path":"/tmp/x"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(msg.model.as_deref(), Some("claude-sonnet-4"));
        assert_eq!(msg.content.len(), 3);
        assert!(matches!(&msg.content[2], ContentBlock::ToolUse { name, .. } if name == "Read"));
    }

    #[test]
    fn unknown_block_type_does_not_fail_the_array() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"user","content":[
                {"type":"text","text":"a"},
                {"type":"hologram","data":"???"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(msg.content.len(), 2);
        assert!(matches!(msg.content[1], ContentBlock::Unknown));
    }

    #[test]
    fn undecodable_content_falls_back_to_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":12345}"#).unwrap();
        assert!(msg.content.is_empty());

        // Array whose elements are not objects at all
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":[1,2]}"#).unwrap();
        assert!(msg.content.is_empty());
    }

    #[test]
    fn tool_result_keeps_opaque_content() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"user","content":[
                {"type":"tool_result","tool_use_id":"t1","content":[{"type":"text","text":"ok"}],"is_error":false}
            ]}"#,
        )
        .unwrap();
        match &msg.content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "t1");
                assert!(content.as_ref().unwrap().is_array());
                assert!(!is_error);
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }
}
