//! Exact phrase search strategy.

use std::sync::Arc;

use tracing::debug;

use serp_types::{PhraseSearchSettings, SearchSettings};

use super::{apply_filters, decorate, QueryStrategy, SimpleStrategy};
use crate::dsl::{BoolQuery, MatchPhraseQuery, MatchQuery, Query};
use crate::error::QueryError;
use crate::fields::resolve_field;
use crate::parser::ParsedQuery;

/// Phrase search over `search.phrase_search.fields`.
///
/// Candidates must contain the phrase in every configured phrase field.
/// Filters, decorations and the rescore window come from the wrapped
/// [`SimpleStrategy`].
#[derive(Debug, Clone)]
pub struct PhraseStrategy {
    simple: SimpleStrategy,
    slop: u32,
}

impl PhraseStrategy {
    pub fn new(settings: Arc<SearchSettings>) -> Self {
        let phrase = &settings.phrase_search;
        let slop = phrase.slop.min(phrase.max_slop);
        Self {
            simple: SimpleStrategy::new(settings),
            slop,
        }
    }

    pub fn settings(&self) -> &PhraseSearchSettings {
        &self.simple.search_settings().phrase_search
    }

    pub fn slop(&self) -> u32 {
        self.slop
    }

    /// Set the phrase slop, clamped to `[0, max_slop]`.
    pub fn set_slop(&mut self, slop: i64) {
        let max = i64::from(self.settings().max_slop);
        self.slop = slop.clamp(0, max) as u32;
    }

    pub fn with_slop(mut self, slop: i64) -> Self {
        self.set_slop(slop);
        self
    }

    fn phrase_fields(&self, language: &str) -> Result<Vec<(String, f64)>, QueryError> {
        self.settings()
            .fields
            .iter()
            .map(|f| Ok((resolve_field(&f.name, language)?, f.boost)))
            .collect()
    }
}

/// Strip quote characters; the whole input is the phrase.
fn phrase_text(text: &str) -> String {
    text.replace('"', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl QueryStrategy for PhraseStrategy {
    fn name(&self) -> &'static str {
        "phrase"
    }

    fn build_pre_query(&self, parsed: &ParsedQuery, language: &str) -> Result<Query, QueryError> {
        let fields = self.phrase_fields(language)?;
        if fields.is_empty() {
            debug!("No phrase fields configured, using keyword pre-query");
            return self.simple.build_pre_query(parsed, language);
        }

        let text = phrase_text(&parsed.residual_text);
        let mut query = BoolQuery::new();
        if text.is_empty() {
            query = query.must(Query::MatchAll);
        } else {
            for (field, boost) in fields {
                query = query.must(Query::MatchPhrase(MatchPhraseQuery {
                    field,
                    query: text.clone(),
                    slop: self.slop,
                    boost,
                }));
            }
        }

        let query = apply_filters(query, parsed, language, &self.simple.settings().range_filters)?;
        debug!(
            strategy = self.name(),
            language,
            slop = self.slop,
            "Built pre-query"
        );
        Ok(Query::Bool(query))
    }

    fn build_rescore_query(&self, text: &str, language: &str) -> Result<Option<Query>, QueryError> {
        let text = phrase_text(text);
        if text.is_empty() {
            return Ok(None);
        }

        let phrase_fields = self.phrase_fields(language)?;
        let mut query = BoolQuery::new();
        for (field, boost) in &phrase_fields {
            query = query.should(Query::Match(MatchQuery {
                field: field.clone(),
                query: text.clone(),
                boost: *boost,
                fuzzy: false,
            }));
        }
        for (field, boost) in self.simple.main_fields(language)? {
            if phrase_fields.iter().any(|(name, _)| *name == field) {
                continue;
            }
            query = query.should(Query::Match(MatchQuery {
                field,
                query: text.clone(),
                boost,
                fuzzy: false,
            }));
        }
        if query.is_empty() {
            return Ok(None);
        }

        let rescore = decorate(Query::Bool(query), self.simple.settings(), language)?;
        Ok(Some(rescore))
    }

    fn node_limit(&self) -> u64 {
        self.settings().node_limit
    }

    fn rescore_window(&self) -> u32 {
        self.simple.rescore_window()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::builder::test_support::search_settings;

    fn strategy() -> PhraseStrategy {
        PhraseStrategy::new(Arc::new(search_settings()))
    }

    fn parsed(text: &str) -> ParsedQuery {
        ParsedQuery {
            residual_text: text.to_string(),
            ..Default::default()
        }
    }

    fn phrase_slops(query: &Query) -> Vec<u32> {
        query
            .as_bool()
            .unwrap()
            .must
            .iter()
            .filter_map(|q| match q {
                Query::MatchPhrase(p) => Some(p.slop),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pre_query_requires_all_phrase_fields() {
        let query = strategy()
            .build_pre_query(&parsed("\"hello world\""), "en")
            .unwrap();
        let bool_query = query.as_bool().unwrap();
        assert_eq!(bool_query.must.len(), 2);
        assert_eq!(
            bool_query.must[0],
            Query::MatchPhrase(MatchPhraseQuery {
                field: "title_lang.en".to_string(),
                query: "hello world".to_string(),
                slop: 0,
                boost: 10.0,
            })
        );
        assert!(bool_query.filter.contains(&Query::term("lang", "en")));
        assert!(bool_query.should.is_empty());
    }

    #[test]
    fn test_slop_is_clamped_in_built_query() {
        let mut strategy = strategy();
        strategy.set_slop(50);
        assert_eq!(strategy.slop(), 2);

        let query = strategy.build_pre_query(&parsed("hello world"), "en").unwrap();
        assert_eq!(phrase_slops(&query), vec![2, 2]);
    }

    #[test]
    fn test_negative_slop_clamps_to_zero() {
        let strategy = strategy().with_slop(-3);
        assert_eq!(strategy.slop(), 0);
    }

    #[test]
    fn test_configured_slop_respects_max() {
        let mut settings = search_settings();
        settings.phrase_search.slop = 9;
        settings.phrase_search.max_slop = 4;
        let strategy = PhraseStrategy::new(Arc::new(settings));
        assert_eq!(strategy.slop(), 4);
    }

    #[test]
    fn test_rescore_uses_plain_match_and_uncovered_main_fields() {
        let mut settings = search_settings();
        settings.default_simple.field_value_factors.clear();
        settings.default_simple.penalties.fields.clear();
        let strategy = PhraseStrategy::new(Arc::new(settings));

        let rescore = strategy
            .build_rescore_query("hello world", "en")
            .unwrap()
            .unwrap();
        let bool_query = rescore.as_bool().unwrap();

        let fields: Vec<&str> = bool_query
            .should
            .iter()
            .map(|q| match q {
                Query::Match(m) => m.field.as_str(),
                other => panic!("expected plain match, got {:?}", other),
            })
            .collect();
        assert_eq!(fields, vec!["title_lang.en", "body_lang.en", "warc_target_hostname"]);
    }

    #[test]
    fn test_empty_phrase_matches_all() {
        let query = strategy().build_pre_query(&parsed(" \" \" "), "en").unwrap();
        assert_eq!(query.as_bool().unwrap().must, vec![Query::MatchAll]);
        assert_eq!(strategy().build_rescore_query("\"\"", "en").unwrap(), None);
    }

    #[test]
    fn test_falls_back_to_keyword_pre_query() {
        let mut settings = search_settings();
        settings.phrase_search.fields.clear();
        let strategy = PhraseStrategy::new(Arc::new(settings));

        let query = strategy.build_pre_query(&parsed("hello"), "en").unwrap();
        assert!(matches!(
            query.as_bool().unwrap().must[0],
            Query::SimpleQueryString(_)
        ));
    }

    #[test]
    fn test_limits() {
        let strategy = strategy();
        assert_eq!(strategy.node_limit(), 10_000);
        assert_eq!(strategy.rescore_window(), 400);
    }

    proptest! {
        #[test]
        fn prop_set_slop_clamps(n in any::<i64>(), max_slop in 0u32..16) {
            let mut settings = search_settings();
            settings.phrase_search.max_slop = max_slop;
            let mut strategy = PhraseStrategy::new(Arc::new(settings));
            strategy.set_slop(n);
            prop_assert_eq!(i64::from(strategy.slop()), n.clamp(0, i64::from(max_slop)));
        }
    }
}
