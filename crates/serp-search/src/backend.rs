//! Search backend abstraction.
//!
//! A [`SearchBackend`] runs one [`SearchRequest`] and returns the raw hits.
//! [`ElasticsearchBackend`](crate::ElasticsearchBackend) talks HTTP;
//! [`MockBackend`] returns canned responses for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::SearchError;
use crate::request::SearchRequest;

/// One hit as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_index")]
    pub index: String,

    #[serde(rename = "_id")]
    pub id: String,

    /// Missing when the backend does not score (e.g. pure filters)
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,

    /// Highlighted fragments by field
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,

    #[serde(rename = "_explanation", default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Value>,
}

/// Backend answer to one search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResponse {
    pub hits: Vec<RawHit>,
    /// Total number of matching documents
    pub total: i64,
    /// Wall time of the backend call
    pub elapsed_nanos: i64,
}

impl BackendResponse {
    /// Parse a search response body.
    ///
    /// `hits.total` may be a plain number or an object with a `value` field.
    pub fn from_json(body: &Value, elapsed_nanos: i64) -> Result<Self, SearchError> {
        let hits = body
            .get("hits")
            .ok_or_else(|| SearchError::InvalidResponse("missing `hits` section".to_string()))?;

        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::Object(obj)) => obj.get("value").and_then(Value::as_i64).unwrap_or(0),
            _ => 0,
        };

        let hits = match hits.get("hits") {
            Some(list) => Vec::<RawHit>::deserialize(list)?,
            None => Vec::new(),
        };

        Ok(Self {
            hits,
            total: total.max(0),
            elapsed_nanos,
        })
    }
}

/// Executes search requests against a document index.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one request. Failures are returned, never retried.
    async fn execute(&self, request: &SearchRequest) -> Result<BackendResponse, SearchError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Canned behaviour of a [`MockBackend`].
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Respond(BackendResponse),
    Fail { status: u16, reason: String },
}

/// Backend that records requests and replays a fixed outcome.
///
/// Useful for testing the pipeline without a running cluster.
pub struct MockBackend {
    outcome: MockOutcome,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockBackend {
    pub fn new(response: BackendResponse) -> Self {
        Self {
            outcome: MockOutcome::Respond(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend that finds nothing.
    pub fn empty() -> Self {
        Self::new(BackendResponse::default())
    }

    /// Backend that rejects every request with the given status.
    pub fn failing(status: u16, reason: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Fail {
                status,
                reason: reason.into(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<SearchRequest> {
        self.requests.lock().await.last().cloned()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn execute(&self, request: &SearchRequest) -> Result<BackendResponse, SearchError> {
        self.requests.lock().await.push(request.clone());
        match &self.outcome {
            MockOutcome::Respond(response) => Ok(response.clone()),
            MockOutcome::Fail { status, reason } => Err(SearchError::Backend {
                status: *status,
                reason: reason.clone(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
