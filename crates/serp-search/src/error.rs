//! Search error types.

use thiserror::Error;

use serp_query::QueryError;

/// Errors that can occur while executing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query construction failed (e.g. invalid configured field)
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Backend could not be reached
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend error (HTTP {status}): {reason}")]
    Backend { status: u16, reason: String },

    /// Backend answered with a body we cannot interpret
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Neither the request nor the configuration names a searchable index
    #[error("No searchable indices configured")]
    NoIndices,

    /// Request path has no registered strategy
    #[error("Unknown search route: {0}")]
    UnknownRoute(String),
}

impl SearchError {
    /// Whether the failure is the server's fault rather than the caller's.
    pub fn is_server_error(&self) -> bool {
        !matches!(self, SearchError::UnknownRoute(_))
    }
}
