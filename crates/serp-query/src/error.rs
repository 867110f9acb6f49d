//! Query construction error types.

use thiserror::Error;

/// Errors that can occur while building queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A configured field name cannot be sent to the backend
    #[error("Invalid search field: {0}")]
    InvalidSearchField(String),
}
