//! Error types shared across the serp crates.

use thiserror::Error;

/// Error type for configuration handling.
#[derive(Debug, Error)]
pub enum SerpError {
    /// Configuration could not be loaded or a section has the wrong shape
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
