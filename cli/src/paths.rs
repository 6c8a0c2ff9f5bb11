//! Claude projects-directory conventions.
//!
//! Claude Code keeps one directory per project under `~/.claude/projects/`,
//! with one JSONL transcript per session inside it. Main conversations and
//! `agent-*` sidechains share the `.jsonl` extension and the engine treats
//! them identically.

use std::path::PathBuf;

/// Default Claude projects directory (`~/.claude/projects`).
///
/// Returns `None` when no home directory can be resolved.
#[must_use]
pub fn default_projects_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude").join("projects"))
}

/// True if the filename looks like a conversation transcript.
#[must_use]
pub fn is_conversation_file(filename: &str) -> bool {
    filename.ends_with(".jsonl")
}

/// Shortened UUID for display (first 8 characters).
#[must_use]
pub fn short_id(id: &str) -> &str {
    if id.len() <= 8 {
        id
    } else {
        &id[..8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_file_detection() {
        assert!(is_conversation_file("abc.jsonl"));
        assert!(is_conversation_file("agent-xyz.jsonl"));
        assert!(!is_conversation_file("notes.txt"));
        assert!(!is_conversation_file("abc.json"));
    }

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("9dbf1107-d255-4d17"), "9dbf1107");
        assert_eq!(short_id("short"), "short");
    }

    #[test]
    fn default_projects_dir_ends_with_claude_projects() {
        if let Some(dir) = default_projects_dir() {
            assert!(dir.ends_with(".claude/projects"));
        }
    }
}
