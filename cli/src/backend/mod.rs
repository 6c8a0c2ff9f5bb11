//! Span sink implementations.
//!
//! The [`Backend`](crate::sync::Backend) contract lives in [`crate::sync`];
//! this module holds the concrete sinks and the name-based factory the CLI
//! uses for runtime selection. Backend-specific options are passed through
//! the [`Config`] opaquely; the engine makes no demands beyond the contract.
//!
//! # Submodules
//!
//! - [`console`] - Writes spans to a text stream for inspection and testing

pub mod console;

pub use console::{ConsoleBackend, ConsoleConfig};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::Backend;
use std::sync::Arc;

/// Create a backend by selector name.
///
/// Unknown names are a configuration error surfaced before any sync work
/// starts.
pub fn create_backend(name: &str, config: &Config) -> Result<Arc<dyn Backend>> {
    match name {
        "console" | "" => Ok(Arc::new(ConsoleBackend::new(ConsoleConfig {
            verbose: config.console.verbose,
            format: config.console.format.clone(),
            no_color: config.console.no_color,
            ..ConsoleConfig::default()
        }))),
        other => Err(Error::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_is_the_default_backend() {
        let config = Config::default();
        assert_eq!(create_backend("console", &config).unwrap().name(), "console");
        assert_eq!(create_backend("", &config).unwrap().name(), "console");
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let config = Config::default();
        let err = create_backend("blackhole", &config).unwrap_err();
        assert!(matches!(err, Error::UnknownBackend(name) if name == "blackhole"));
    }
}
