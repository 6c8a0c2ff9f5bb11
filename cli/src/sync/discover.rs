//! Conversation file discovery.

use crate::error::{Error, Result};
use crate::paths;
use std::path::{Path, PathBuf};

/// Enumerate candidate transcript files under a projects root.
///
/// One level deep: each immediate subdirectory is a project, and every
/// regular `.jsonl` file inside it is a candidate (agent sidechains
/// included). Ordering is unspecified. A missing root yields an empty
/// list; an unreadable project directory is skipped silently.
pub fn discover_files(projects_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = match std::fs::read_dir(projects_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(err) => {
            return Err(Error::Discovery {
                path: projects_dir.to_path_buf(),
                source: err,
            })
        }
    };

    for entry in entries {
        let entry = entry.map_err(|err| Error::Discovery {
            path: projects_dir.to_path_buf(),
            source: err,
        })?;
        let project_dir = entry.path();
        if !project_dir.is_dir() {
            continue;
        }

        let Ok(project_files) = std::fs::read_dir(&project_dir) else {
            tracing::debug!(path = %project_dir.display(), "skipping unreadable project dir");
            continue;
        };

        for file in project_files.flatten() {
            let path = file.path();
            let is_file = file.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = file.file_name();
            let Some(name) = name.to_str() else { continue };
            if is_file && paths::is_conversation_file(name) {
                files.push(path);
            }
        }
    }

    Ok(files)
}
