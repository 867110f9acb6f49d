//! Elasticsearch HTTP backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use serp_types::ClusterSettings;

use crate::backend::{BackendResponse, SearchBackend};
use crate::error::SearchError;
use crate::request::SearchRequest;

/// Backend that posts requests to `{host}/{indices}/_search`.
pub struct ElasticsearchBackend {
    client: Client,
    host: String,
    username: Option<String>,
    password: Option<SecretString>,
}

impl ElasticsearchBackend {
    /// Create a client from the `cluster` configuration section.
    pub fn new(settings: &ClusterSettings) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            host: settings.host.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone().map(SecretString::from),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn search_url(&self, request: &SearchRequest) -> String {
        format!("{}/{}/_search", self.host, request.index_path())
    }
}

/// Pull the most specific failure reason out of an error body.
fn error_reason(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let error = &value["error"];
    error["root_cause"][0]["reason"]
        .as_str()
        .or_else(|| error["reason"].as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn execute(&self, request: &SearchRequest) -> Result<BackendResponse, SearchError> {
        let url = self.search_url(request);
        debug!(url = %url, from = request.from, size = request.size, "Sending search request");

        let started = Instant::now();
        let mut builder = self.client.post(&url).json(&request.to_body());
        if let Some(username) = &self.username {
            builder = builder.basic_auth(
                username,
                self.password.as_ref().map(|p| p.expose_secret().to_string()),
            );
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = error_reason(&body);
            warn!(status = status.as_u16(), reason = %reason, "Backend rejected search");
            return Err(SearchError::Backend {
                status: status.as_u16(),
                reason,
            });
        }

        let body: Value = response.json().await?;
        let elapsed_nanos = i64::try_from(started.elapsed().as_nanos()).unwrap_or(i64::MAX);
        BackendResponse::from_json(&body, elapsed_nanos)
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}
