//! Error types for TraceUp.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=store, 3=discovery, 4=parse, etc.)
//! - Retryability flags for agent self-correction
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Per-file sync failures never map to a process exit code: the coordinator
//! collects them into the aggregated result and the run still exits zero.
//! Only discovery, store-open, and configuration failures are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for TraceUp operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Agents match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (exit 2)
    StoreError,

    // Discovery (exit 3)
    DiscoveryError,

    // Parse (exit 4)
    ParseError,
    OversizedLine,

    // Backend (exit 5)
    BackendError,
    UnknownBackend,

    // Config (exit 6)
    ConfigError,

    // I/O (exit 7)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StoreError => "STORE_ERROR",
            Self::DiscoveryError => "DISCOVERY_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::OversizedLine => "OVERSIZED_LINE",
            Self::BackendError => "BACKEND_ERROR",
            Self::UnknownBackend => "UNKNOWN_BACKEND",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-7).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::StoreError => 2,
            Self::DiscoveryError => 3,
            Self::ParseError | Self::OversizedLine => 4,
            Self::BackendError | Self::UnknownBackend => 5,
            Self::ConfigError => 6,
            Self::IoError | Self::JsonError => 7,
        }
    }

    /// Whether an agent should retry with corrected input.
    ///
    /// True for configuration and backend-selection errors where a
    /// different flag value fixes the problem. False for data errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UnknownBackend | Self::ConfigError)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in TraceUp operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Discovery failed for {path}: {source}")]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error at {path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Line {line} of {path} exceeds {max_bytes} bytes")]
    OversizedLine {
        path: PathBuf,
        line: u64,
        max_bytes: u64,
    },

    #[error("Backend '{backend}' error: {message}")]
    Backend { backend: String, message: String },

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Store(_) => ErrorCode::StoreError,
            Self::Discovery { .. } => ErrorCode::DiscoveryError,
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::OversizedLine { .. } => ErrorCode::OversizedLine,
            Self::Backend { .. } => ErrorCode::BackendError,
            Self::UnknownBackend(_) => ErrorCode::UnknownBackend,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for agents and humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::UnknownBackend(name) => Some(format!(
                "No backend named '{name}'. Available backends: console."
            )),

            Self::OversizedLine { max_bytes, .. } => Some(format!(
                "Records larger than {max_bytes} bytes are treated as malformed. \
                 The file may be corrupt or not JSONL."
            )),

            Self::Discovery { path, .. } => Some(format!(
                "Check that '{}' exists and is readable, or set \
                 CLAUDE_PROJECTS_DIR / --projects-dir to the right location.",
                path.display()
            )),

            Self::Config(_) => {
                Some("Run `traceup sync --help` for recognised options.".to_string())
            }

            Self::Store(_)
            | Self::Parse { .. }
            | Self::Backend { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint. Agents parse this instead of stderr text.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(Error::Other("boom".into()).exit_code(), 1);
        assert_eq!(Error::UnknownBackend("x".into()).exit_code(), 5);
        assert_eq!(Error::Config("bad".into()).exit_code(), 6);
        assert_eq!(
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "io")).exit_code(),
            7
        );
    }

    #[test]
    fn unknown_backend_is_retryable_with_hint() {
        let err = Error::UnknownBackend("langfuze".into());
        assert!(err.error_code().is_retryable());
        assert!(err.hint().unwrap().contains("console"));
    }

    #[test]
    fn structured_json_shape() {
        let err = Error::UnknownBackend("nope".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "UNKNOWN_BACKEND");
        assert_eq!(json["error"]["exit_code"], 5);
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn oversized_line_message_names_the_line() {
        let err = Error::OversizedLine {
            path: PathBuf::from("/p/a.jsonl"),
            line: 7,
            max_bytes: 10 * 1024 * 1024,
        };
        assert!(err.to_string().contains("Line 7"));
        assert_eq!(err.exit_code(), 4);
    }
}
