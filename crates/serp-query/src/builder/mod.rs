//! Two-phase query construction.
//!
//! A [`QueryStrategy`] turns a parsed query into a cheap pre-query that
//! selects the candidate window and an expensive rescore query that ranks the
//! top of that window. [`SimpleStrategy`] implements keyword search;
//! [`PhraseStrategy`] wraps it for exact phrase search.

mod phrase;
mod simple;

pub use phrase::PhraseStrategy;
pub use simple::SimpleStrategy;

use serp_types::{FieldBoost, Penalties, RangeFilter, SimpleSearchSettings};

use crate::dsl::{BoolQuery, FieldValueFactorFunction, Query, RangeQuery};
use crate::error::QueryError;
use crate::fields::{localized, resolve_field, BODY_FIELD, LANGUAGE_FIELD, TITLE_FIELD};
use crate::parser::ParsedQuery;

/// Highlighting request for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHighlightSpec {
    pub field: String,
    /// Fragment length in characters
    pub fragment_size: u32,
    /// 0 highlights the whole field as one fragment
    pub number_of_fragments: u32,
}

impl FieldHighlightSpec {
    pub fn new(field: impl Into<String>, fragment_size: u32, number_of_fragments: u32) -> Self {
        Self {
            field: field.into(),
            fragment_size,
            number_of_fragments,
        }
    }
}

/// Snippet length for body highlights.
pub const SNIPPET_FRAGMENT_SIZE: u32 = 300;

/// Query construction capability shared by all search strategies.
pub trait QueryStrategy: Send + Sync {
    /// Short name used in logs and route tables.
    fn name(&self) -> &'static str;

    /// Build the filtering/matching query run over the whole index.
    fn build_pre_query(&self, parsed: &ParsedQuery, language: &str) -> Result<Query, QueryError>;

    /// Build the precise scoring query applied to the top candidates.
    ///
    /// `None` when there is no free text to score.
    fn build_rescore_query(&self, text: &str, language: &str) -> Result<Option<Query>, QueryError>;

    /// Backend `terminate_after` value.
    fn node_limit(&self) -> u64;

    /// Number of top candidates the rescore query is applied to.
    fn rescore_window(&self) -> u32;

    fn highlighters(&self, language: &str) -> Vec<FieldHighlightSpec> {
        vec![
            FieldHighlightSpec::new(localized(TITLE_FIELD, language), 0, 0),
            FieldHighlightSpec::new(localized(BODY_FIELD, language), SNIPPET_FRAGMENT_SIZE, 1),
        ]
    }
}

/// Add directive, language and range restrictions to a bool query.
pub(crate) fn apply_filters(
    mut query: BoolQuery,
    parsed: &ParsedQuery,
    language: &str,
    range_filters: &[RangeFilter],
) -> Result<BoolQuery, QueryError> {
    for directive in parsed.filters() {
        let field = resolve_field(&directive.field, language)?;
        let term = Query::term(field, directive.value.clone());
        query = if directive.negate {
            query.must_not(term)
        } else {
            query.filter(term)
        };
    }

    query = query.filter(Query::term(LANGUAGE_FIELD, language));

    for range in range_filters {
        let clause = Query::Range(RangeQuery {
            field: resolve_field(&range.name, language)?,
            gt: range.gt,
            gte: range.gte,
            lt: range.lt,
            lte: range.lte,
        });
        query = if range.negate {
            query.must_not(clause)
        } else {
            query.filter(clause)
        };
    }

    Ok(query)
}

pub(crate) fn boost_clause(boost: &FieldBoost, language: &str) -> Result<Query, QueryError> {
    Ok(Query::boosted_term(
        resolve_field(&boost.name, language)?,
        boost.value.clone(),
        boost.match_boost,
    ))
}

/// Wrap a scoring query with field value factors and penalties.
pub(crate) fn decorate(
    query: Query,
    settings: &SimpleSearchSettings,
    language: &str,
) -> Result<Query, QueryError> {
    let mut query = query;

    if !settings.field_value_factors.is_empty() {
        let functions = settings
            .field_value_factors
            .iter()
            .map(|f| {
                Ok(FieldValueFactorFunction {
                    field: resolve_field(&f.name, language)?,
                    factor: f.factor,
                    modifier: f.modifier,
                    missing: f.missing,
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        query = Query::FunctionScore {
            query: Box::new(query),
            functions,
        };
    }

    penalize(query, &settings.penalties, language)
}

fn penalize(query: Query, penalties: &Penalties, language: &str) -> Result<Query, QueryError> {
    if penalties.fields.is_empty() {
        return Ok(query);
    }

    let mut negative = BoolQuery::new();
    for penalty in &penalties.fields {
        negative = negative.should(Query::boosted_term(
            resolve_field(&penalty.name, language)?,
            penalty.value.clone(),
            penalty.boost,
        ));
    }

    Ok(Query::Boosting {
        positive: Box::new(query),
        negative: Box::new(Query::Bool(negative)),
        negative_boost: penalties.penalty_factor,
    })
}
