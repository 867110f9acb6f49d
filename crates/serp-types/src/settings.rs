//! Typed configuration sections.
//!
//! Every struct here mirrors one subtree of the configuration file. Absent
//! values resolve to the defaults declared with `#[serde(default = ...)]`, so
//! a missing key is never an error.

use serde::{Deserialize, Serialize};

/// Index alias entry (`cluster.index_aliases[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexAlias {
    /// Real backend index name
    pub index: String,

    /// Short alias accepted in requests and directives
    #[serde(default)]
    pub alias: String,

    /// Human-readable name shown next to results
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Backend cluster settings (`cluster`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Base URL of the search backend
    #[serde(default = "default_cluster_host")]
    pub host: String,

    /// Basic-auth user name
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password (wrapped in a secret by the backend client)
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Indices a request may target
    #[serde(default)]
    pub indices: Vec<String>,

    /// Indices searched when a request names none
    #[serde(default)]
    pub default_indices: Vec<String>,

    #[serde(default)]
    pub index_aliases: Vec<IndexAlias>,
}

fn default_cluster_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            host: default_cluster_host(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            indices: Vec::new(),
            default_indices: Vec::new(),
            index_aliases: Vec::new(),
        }
    }
}

/// A searchable text field (`search.default_simple.main_fields[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MainField {
    /// Field name, may contain the `%lang%` placeholder
    pub name: String,

    #[serde(default = "default_weight")]
    pub boost: f64,

    /// Add a sloppy phrase clause for this field during rescoring
    #[serde(default)]
    pub proximity_matching: bool,

    #[serde(default = "default_proximity_slop")]
    pub proximity_slop: u32,

    #[serde(default = "default_weight")]
    pub proximity_boost: f64,

    /// Add an auto-fuzziness match clause for this field during rescoring
    #[serde(default)]
    pub fuzzy_matching: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_proximity_slop() -> u32 {
    3
}

/// Range restriction applied to every pre-query (`range_filters[]`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RangeFilter {
    pub name: String,
    #[serde(default)]
    pub gt: Option<f64>,
    #[serde(default)]
    pub gte: Option<f64>,
    #[serde(default)]
    pub lt: Option<f64>,
    #[serde(default)]
    pub lte: Option<f64>,
    /// Exclude documents inside the range instead of requiring them
    #[serde(default)]
    pub negate: bool,
}

/// Field-value boost (`boosts[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldBoost {
    pub name: String,

    /// Term value that earns the boost
    pub value: String,

    /// Also apply the boost during the pre-query
    #[serde(default, rename = "match")]
    pub is_match: bool,

    #[serde(default = "default_weight")]
    pub match_boost: f64,
}

/// Modifier applied to a numeric field before it scales the score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FactorModifier {
    #[default]
    None,
    Log,
    Log1p,
    Log2p,
    Ln,
    Ln1p,
    Ln2p,
    Square,
    Sqrt,
    Reciprocal,
}

impl FactorModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorModifier::None => "none",
            FactorModifier::Log => "log",
            FactorModifier::Log1p => "log1p",
            FactorModifier::Log2p => "log2p",
            FactorModifier::Ln => "ln",
            FactorModifier::Ln1p => "ln1p",
            FactorModifier::Ln2p => "ln2p",
            FactorModifier::Square => "square",
            FactorModifier::Sqrt => "sqrt",
            FactorModifier::Reciprocal => "reciprocal",
        }
    }
}

/// Score function over a stored numeric field (`field_value_factors[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValueFactor {
    pub name: String,

    #[serde(default = "default_weight")]
    pub factor: f64,

    #[serde(default)]
    pub modifier: FactorModifier,

    /// Value used for documents without the field
    #[serde(default)]
    pub missing: Option<f64>,
}

/// A penalised field value (`penalties.fields[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyField {
    pub name: String,
    pub value: String,
    #[serde(default = "default_weight")]
    pub boost: f64,
}

/// Negative boosting settings (`penalties`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Penalties {
    #[serde(default)]
    pub fields: Vec<PenaltyField>,

    /// Score multiplier for documents matching a penalty clause
    #[serde(default = "default_penalty_factor")]
    pub penalty_factor: f64,
}

fn default_penalty_factor() -> f64 {
    0.2
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            penalty_factor: default_penalty_factor(),
        }
    }
}

/// Inline directive definition (`query_filters[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryFilter {
    /// Keyword typed by the user, e.g. `site`
    pub keyword: String,

    /// Target field; empty or `#`-prefixed for control directives
    #[serde(default)]
    pub field: String,
}

impl QueryFilter {
    pub fn new(keyword: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            field: field.into(),
        }
    }
}

/// Simple search strategy settings (`search.default_simple`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimpleSearchSettings {
    #[serde(default)]
    pub main_fields: Vec<MainField>,

    #[serde(default)]
    pub range_filters: Vec<RangeFilter>,

    #[serde(default)]
    pub boosts: Vec<FieldBoost>,

    #[serde(default)]
    pub field_value_factors: Vec<FieldValueFactor>,

    #[serde(default)]
    pub penalties: Penalties,

    #[serde(default)]
    pub query_filters: Vec<QueryFilter>,

    /// Backend `terminate_after` limit
    #[serde(default = "default_simple_node_limit")]
    pub node_limit: u64,

    #[serde(default = "default_rescore_window")]
    pub rescore_window: u32,
}

fn default_simple_node_limit() -> u64 {
    200_000
}

fn default_rescore_window() -> u32 {
    400
}

impl Default for SimpleSearchSettings {
    fn default() -> Self {
        Self {
            main_fields: Vec::new(),
            range_filters: Vec::new(),
            boosts: Vec::new(),
            field_value_factors: Vec::new(),
            penalties: Penalties::default(),
            query_filters: Vec::new(),
            node_limit: default_simple_node_limit(),
            rescore_window: default_rescore_window(),
        }
    }
}

/// Field matched as an exact phrase (`search.phrase_search.fields[]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhraseField {
    pub name: String,
    #[serde(default = "default_weight")]
    pub boost: f64,
}

/// Phrase search strategy settings (`search.phrase_search`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhraseSearchSettings {
    #[serde(default)]
    pub fields: Vec<PhraseField>,

    #[serde(default)]
    pub slop: u32,

    #[serde(default = "default_max_slop")]
    pub max_slop: u32,

    #[serde(default = "default_phrase_node_limit")]
    pub node_limit: u64,
}

fn default_max_slop() -> u32 {
    2
}

fn default_phrase_node_limit() -> u64 {
    10_000
}

impl Default for PhraseSearchSettings {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            slop: 0,
            max_slop: default_max_slop(),
            node_limit: default_phrase_node_limit(),
        }
    }
}

/// Search settings (`search`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    /// Language searched when no `lang` directive is given
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub default_simple: SimpleSearchSettings,

    #[serde(default)]
    pub phrase_search: PhraseSearchSettings,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            default_simple: SimpleSearchSettings::default(),
            phrase_search: PhraseSearchSettings::default(),
        }
    }
}

/// Result page settings (`serp.pagination`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationSettings {
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u64,
}

pub(crate) fn default_results_per_page() -> u64 {
    10
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            results_per_page: default_results_per_page(),
        }
    }
}

/// Result page rendering settings (`serp`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SerpSettings {
    #[serde(default)]
    pub pagination: PaginationSettings,
}

/// Complete application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub cluster: ClusterSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub serp: SerpSettings,
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            cluster: ClusterSettings::default(),
            search: SearchSettings::default(),
            serp: SerpSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_defaults() {
        let settings = SimpleSearchSettings::default();
        assert_eq!(settings.node_limit, 200_000);
        assert_eq!(settings.rescore_window, 400);
        assert!((settings.penalties.penalty_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_phrase_defaults() {
        let settings = PhraseSearchSettings::default();
        assert_eq!(settings.slop, 0);
        assert_eq!(settings.max_slop, 2);
        assert_eq!(settings.node_limit, 10_000);
    }

    #[test]
    fn test_main_field_defaults_from_json() {
        let field: MainField = serde_json::from_str(r#"{"name": "title_lang.%lang%"}"#).unwrap();
        assert!((field.boost - 1.0).abs() < f64::EPSILON);
        assert!((field.proximity_boost - 1.0).abs() < f64::EPSILON);
        assert!(!field.proximity_matching);
        assert!(!field.fuzzy_matching);
    }

    #[test]
    fn test_boost_match_flag_rename() {
        let boost: FieldBoost =
            serde_json::from_str(r#"{"name": "warc_target_path.raw", "value": "/", "match": true}"#)
                .unwrap();
        assert!(boost.is_match);
        assert!((boost.match_boost - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_modifier_serialization() {
        let factor: FieldValueFactor =
            serde_json::from_str(r#"{"name": "page_rank", "modifier": "log1p", "missing": 0.0}"#)
                .unwrap();
        assert_eq!(factor.modifier, FactorModifier::Log1p);
        assert_eq!(factor.modifier.as_str(), "log1p");
        assert_eq!(factor.missing, Some(0.0));
    }
}
