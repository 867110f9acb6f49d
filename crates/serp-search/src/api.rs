//! JSON API response model.
//!
//! `minimal` responses carry only what is needed to link a result; full
//! responses add display fields, ranks and explanations.

use serde::Serialize;

use crate::mapper::{Explanation, SearchResult};
use crate::pipeline::ResultPage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiMeta {
    pub query_time_ms: i64,
    pub total_results: u64,
    pub indices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult {
    pub score: f64,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trec_id: Option<String>,
    pub target_uri: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_rank: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spam_rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl ApiResult {
    pub fn from_result(result: &SearchResult, minimal: bool) -> Self {
        let mut api = Self {
            score: result.score,
            uuid: result.document_id.clone(),
            trec_id: result.trec_id.clone(),
            target_uri: result.target_uri.clone(),
            index: None,
            target_hostname: None,
            page_rank: None,
            spam_rank: None,
            title: None,
            snippet: None,
            explanation: None,
        };
        if !minimal {
            api.index = Some(result.display_index.clone());
            api.target_hostname = Some(result.target_hostname.clone());
            api.page_rank = result.page_rank;
            api.spam_rank = result.spam_rank;
            api.title = Some(result.title.clone());
            api.snippet = Some(result.snippet.clone());
            api.explanation = result.explanation.clone();
        }
        api
    }
}

/// Body of a search API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub meta: ApiMeta,
    pub results: Vec<ApiResult>,
}

impl ApiResponse {
    pub fn from_page(page: &ResultPage, minimal: bool) -> Self {
        Self {
            meta: ApiMeta {
                query_time_ms: page.elapsed_nanos / 1_000_000,
                total_results: page.total_results,
                indices: page.effective_indices.clone(),
            },
            results: page
                .results
                .iter()
                .map(|r| ApiResult::from_result(r, minimal))
                .collect(),
        }
    }
}
