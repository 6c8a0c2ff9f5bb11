//! Content extraction from parsed messages.

use crate::jsonl::types::{ContentBlock, Message};

/// Concatenated text content of a message, one block per line.
#[must_use]
pub fn extract_text(msg: &Message) -> String {
    let texts: Vec<&str> = msg
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
        .collect();
    texts.join("\n")
}

/// Concatenated thinking content of a message.
#[must_use]
pub fn extract_thinking(msg: &Message) -> String {
    let thoughts: Vec<&str> = msg
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Thinking { thinking } if !thinking.is_empty() => {
                Some(thinking.as_str())
            }
            _ => None,
        })
        .collect();
    thoughts.join("\n")
}

/// Names of all tools invoked by a message.
#[must_use]
pub fn extract_tool_calls(msg: &Message) -> Vec<String> {
    msg.content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { name, .. } if !name.is_empty() => Some(name.clone()),
            _ => None,
        })
        .collect()
}
