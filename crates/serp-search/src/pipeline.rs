//! End-to-end search pipeline.
//!
//! One [`SearchPipeline`] is built at startup from the settings and a backend
//! handle, then shared by all requests. Each call parses the raw query,
//! resolves indices and language, builds the two-phase query with the given
//! [`QueryStrategy`], runs it and maps the hits into a [`ResultPage`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use serp_query::fields::{BODY_FIELD, LANG_PLACEHOLDER};
use serp_query::{
    IndexSelector, ParsedQuery, PhraseStrategy, QueryStrategy, QueryStringParser, SimpleStrategy,
};
use serp_types::{SearchSettings, Settings};

use crate::backend::SearchBackend;
use crate::error::SearchError;
use crate::mapper::{ResultMapper, SearchResult};
use crate::pagination::{NavEntry, Paginator};
use crate::request::SearchRequest;

/// Caller-supplied search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Raw query string, directives included
    pub query: String,
    /// Requested 1-based page
    pub page: u64,
    /// Requested indices or aliases
    pub indices: Option<Vec<String>>,
    pub language: Option<String>,
    pub explain: bool,
    /// Return stored body text with each result
    pub full_body: bool,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            indices: None,
            language: None,
            explain: false,
            full_body: false,
        }
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn with_indices(mut self, indices: Vec<String>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_full_body(mut self, full_body: bool) -> Self {
        self.full_body = full_body;
        self
    }
}

/// A request built but not yet sent.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub parsed: ParsedQuery,
    pub language: String,
    /// Allowed indices as requested (aliases kept)
    pub active_indices: Vec<String>,
    pub request: SearchRequest,
}

/// One page of ranked results.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub results: Vec<SearchResult>,
    pub total_results: u64,
    pub results_per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub navigation: Vec<NavEntry>,
    pub elapsed_nanos: i64,
    pub effective_indices: Vec<String>,
    pub language: String,
    /// Query text after directive extraction
    pub query: String,
}

/// Query construction and execution shared by all requests.
pub struct SearchPipeline {
    search_settings: Arc<SearchSettings>,
    selector: Arc<IndexSelector>,
    parser: QueryStringParser,
    paginator: Paginator,
    backend: Arc<dyn SearchBackend>,
}

impl SearchPipeline {
    pub fn new(settings: &Settings, backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            search_settings: Arc::new(settings.search.clone()),
            selector: Arc::new(IndexSelector::from_settings(&settings.cluster)),
            parser: QueryStringParser::new(&settings.search.default_simple.query_filters),
            paginator: Paginator::from_settings(&settings.serp.pagination),
            backend,
        }
    }

    pub fn selector(&self) -> &IndexSelector {
        &self.selector
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn search_settings(&self) -> Arc<SearchSettings> {
        Arc::clone(&self.search_settings)
    }

    pub fn simple_strategy(&self) -> SimpleStrategy {
        SimpleStrategy::new(self.search_settings())
    }

    pub fn phrase_strategy(&self) -> PhraseStrategy {
        PhraseStrategy::new(self.search_settings())
    }

    /// Parse the query and build the backend request without sending it.
    pub fn prepare(
        &self,
        params: &SearchParams,
        strategy: &dyn QueryStrategy,
    ) -> Result<PreparedSearch, SearchError> {
        let parsed = self.parser.parse(&params.query);

        let language = [
            parsed.language_override.as_deref(),
            params.language.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .find(|lang| {
            let usable = is_language_code(lang);
            if !usable {
                warn!(language = %lang, "Ignoring malformed language");
            }
            usable
        })
        .map(str::to_string)
        .unwrap_or_else(|| self.search_settings.default_language.clone());

        let candidates = parsed
            .index_override
            .as_deref()
            .or(params.indices.as_deref());
        let active_indices = self.selector.resolve_active(candidates);
        if active_indices.is_empty() {
            return Err(SearchError::NoIndices);
        }

        let mut indices: Vec<String> = Vec::with_capacity(active_indices.len());
        for name in &active_indices {
            let index = self.selector.canonical_index(name).to_string();
            if !indices.contains(&index) {
                indices.push(index);
            }
        }

        let pre_query = strategy.build_pre_query(&parsed, &language)?;
        let rescore_query = strategy.build_rescore_query(&parsed.residual_text, &language)?;

        let source_excludes = if params.full_body {
            Vec::new()
        } else {
            vec![BODY_FIELD.replace(LANG_PLACEHOLDER, "*")]
        };

        let request = SearchRequest {
            indices,
            pre_query,
            rescore_query,
            from: self.paginator.offset(params.page),
            size: self.paginator.results_per_page(),
            explain: params.explain,
            node_limit: strategy.node_limit(),
            rescore_window: strategy.rescore_window(),
            highlighters: strategy.highlighters(&language),
            source_excludes,
        };

        debug!(
            strategy = strategy.name(),
            language = %language,
            indices = ?request.indices,
            from = request.from,
            "Prepared search request"
        );

        Ok(PreparedSearch {
            parsed,
            language,
            active_indices,
            request,
        })
    }

    /// Run one search.
    pub async fn search(
        &self,
        params: &SearchParams,
        strategy: &dyn QueryStrategy,
    ) -> Result<ResultPage, SearchError> {
        let mut prepared = self.prepare(params, strategy)?;
        let mut response = self.backend.execute(&prepared.request).await?;

        // A page past the end is served as the last reachable page.
        let total = u64::try_from(response.total).unwrap_or(0);
        if total > 0 && prepared.request.from >= total {
            let last = self.paginator.page(total, params.page).current_page;
            prepared.request.from = self.paginator.offset(last);
            debug!(
                requested = params.page,
                page = last,
                from = prepared.request.from,
                "Requested page past the end, fetching last page"
            );
            response = self.backend.execute(&prepared.request).await?;
        }

        let results = ResultMapper::new(&self.selector, &prepared.language)
            .with_explain(params.explain)
            .with_full_body(params.full_body)
            .with_grouping(!prepared.parsed.grouping_suppressed)
            .map(&response.hits);

        let total = u64::try_from(response.total).unwrap_or(0);
        let info = self.paginator.page(total, params.page);

        info!(
            strategy = strategy.name(),
            backend = self.backend.name(),
            query = %prepared.parsed.residual_text,
            total_results = total,
            returned = results.len(),
            page = info.current_page,
            elapsed_ms = response.elapsed_nanos / 1_000_000,
            "Search completed"
        );

        Ok(ResultPage {
            results,
            total_results: total,
            results_per_page: info.results_per_page,
            current_page: info.current_page,
            total_pages: info.total_pages,
            navigation: info.navigation,
            elapsed_nanos: response.elapsed_nanos,
            effective_indices: prepared.active_indices,
            language: prepared.language,
            query: prepared.parsed.residual_text,
        })
    }
}

/// Language codes are substituted into field names, so only plain tokens
/// are accepted from requests.
fn is_language_code(lang: &str) -> bool {
    !lang.is_empty()
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
