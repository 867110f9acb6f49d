//! Keyword search strategy.

use std::sync::Arc;

use tracing::debug;

use serp_types::{SearchSettings, SimpleSearchSettings};

use super::{apply_filters, boost_clause, decorate, QueryStrategy};
use crate::dsl::{
    BoolQuery, MatchPhraseQuery, MatchQuery, Operator, Query, QueryFlag, SimpleQueryString,
};
use crate::error::QueryError;
use crate::fields::resolve_field;
use crate::parser::ParsedQuery;

/// Share of optional terms that must match during rescoring.
const RESCORE_MINIMUM_SHOULD_MATCH: &str = "30%";

const PRE_QUERY_FLAGS: [QueryFlag; 4] = [
    QueryFlag::And,
    QueryFlag::Or,
    QueryFlag::Not,
    QueryFlag::Whitespace,
];

const RESCORE_FLAGS: [QueryFlag; 6] = [
    QueryFlag::And,
    QueryFlag::Or,
    QueryFlag::Not,
    QueryFlag::Phrase,
    QueryFlag::Prefix,
    QueryFlag::Whitespace,
];

/// Multi-field keyword search over `search.default_simple.main_fields`.
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    settings: Arc<SearchSettings>,
}

impl SimpleStrategy {
    pub fn new(settings: Arc<SearchSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SimpleSearchSettings {
        &self.settings.default_simple
    }

    pub(crate) fn search_settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Resolved main field names with their weights.
    pub(crate) fn main_fields(&self, language: &str) -> Result<Vec<(String, f64)>, QueryError> {
        self.settings()
            .main_fields
            .iter()
            .map(|f| Ok((resolve_field(&f.name, language)?, f.boost)))
            .collect()
    }
}

impl QueryStrategy for SimpleStrategy {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn build_pre_query(&self, parsed: &ParsedQuery, language: &str) -> Result<Query, QueryError> {
        let settings = self.settings();
        let text = parsed.residual_text.trim();

        let matcher = if text.is_empty() {
            Query::MatchAll
        } else {
            Query::SimpleQueryString(SimpleQueryString {
                query: text.to_string(),
                fields: self.main_fields(language)?,
                default_operator: Operator::And,
                flags: PRE_QUERY_FLAGS.to_vec(),
                minimum_should_match: None,
            })
        };

        let mut query = apply_filters(
            BoolQuery::new().must(matcher),
            parsed,
            language,
            &settings.range_filters,
        )?;

        for boost in settings.boosts.iter().filter(|b| b.is_match) {
            query = query.should(boost_clause(boost, language)?);
        }

        debug!(
            strategy = self.name(),
            language,
            filters = query.filter.len(),
            "Built pre-query"
        );
        Ok(Query::Bool(query))
    }

    fn build_rescore_query(&self, text: &str, language: &str) -> Result<Option<Query>, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let settings = self.settings();

        let mut query = BoolQuery::new().must(Query::SimpleQueryString(SimpleQueryString {
            query: text.to_string(),
            fields: self.main_fields(language)?,
            default_operator: Operator::Or,
            flags: RESCORE_FLAGS.to_vec(),
            minimum_should_match: Some(RESCORE_MINIMUM_SHOULD_MATCH.to_string()),
        }));

        for field in &settings.main_fields {
            if field.proximity_matching {
                query = query.should(Query::MatchPhrase(MatchPhraseQuery {
                    field: resolve_field(&field.name, language)?,
                    query: text.to_string(),
                    slop: field.proximity_slop,
                    boost: field.proximity_boost / 2.0,
                }));
            }
            if field.fuzzy_matching {
                query = query.should(Query::Match(MatchQuery {
                    field: resolve_field(&field.name, language)?,
                    query: text.to_string(),
                    boost: field.boost,
                    fuzzy: true,
                }));
            }
        }

        for boost in &settings.boosts {
            query = query.should(boost_clause(boost, language)?);
        }

        let rescore = decorate(Query::Bool(query), settings, language)?;
        debug!(strategy = self.name(), language, "Built rescore query");
        Ok(Some(rescore))
    }

    fn node_limit(&self) -> u64 {
        self.settings().node_limit
    }

    fn rescore_window(&self) -> u32 {
        self.settings().rescore_window
    }
}
