//! Backend query tree.
//!
//! A small typed subset of the Elasticsearch query DSL. Builders assemble
//! [`Query`] values; [`Query::to_json`] renders the wire form.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use serp_types::FactorModifier;

/// Operator joining the terms of a simple query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

/// Syntax features enabled for a simple query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFlag {
    And,
    Or,
    Not,
    Phrase,
    Prefix,
    Whitespace,
}

impl QueryFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryFlag::And => "AND",
            QueryFlag::Or => "OR",
            QueryFlag::Not => "NOT",
            QueryFlag::Phrase => "PHRASE",
            QueryFlag::Prefix => "PREFIX",
            QueryFlag::Whitespace => "WHITESPACE",
        }
    }
}

/// Multi-field match using the `+ | -` operator syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleQueryString {
    pub query: String,
    /// Field names with their weights
    pub fields: Vec<(String, f64)>,
    pub default_operator: Operator,
    pub flags: Vec<QueryFlag>,
    pub minimum_should_match: Option<String>,
}

/// Single-field full-text match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub field: String,
    pub query: String,
    pub boost: f64,
    /// Use automatic edit distance
    pub fuzzy: bool,
}

/// Single-field phrase match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPhraseQuery {
    pub field: String,
    pub query: String,
    pub slop: u32,
    pub boost: f64,
}

/// Numeric range restriction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

/// Score function reading a stored numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValueFactorFunction {
    pub field: String,
    pub factor: f64,
    pub modifier: FactorModifier,
    pub missing: Option<f64>,
}

/// Boolean combination of clauses.
///
/// `filter` and `must_not` never contribute to the score; `should` clauses
/// only add score while at least one `must` clause is present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub filter: Vec<Query>,
    pub should: Vec<Query>,
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.filter.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (name, clauses) in [
            ("must", &self.must),
            ("filter", &self.filter),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    name.to_string(),
                    Value::Array(clauses.iter().map(Query::to_json).collect()),
                );
            }
        }
        json!({ "bool": body })
    }
}

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Term {
        field: String,
        value: String,
        boost: Option<f64>,
    },
    Range(RangeQuery),
    SimpleQueryString(SimpleQueryString),
    Match(MatchQuery),
    MatchPhrase(MatchPhraseQuery),
    Bool(BoolQuery),
    FunctionScore {
        query: Box<Query>,
        functions: Vec<FieldValueFactorFunction>,
    },
    Boosting {
        positive: Box<Query>,
        negative: Box<Query>,
        negative_boost: f64,
    },
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
            boost: None,
        }
    }

    pub fn boosted_term(field: impl Into<String>, value: impl Into<String>, boost: f64) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
            boost: Some(boost),
        }
    }

    /// Borrow the boolean body, if this is a bool query.
    pub fn as_bool(&self) -> Option<&BoolQuery> {
        match self {
            Query::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Render the Elasticsearch JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Term { field, value, boost } => match boost {
                Some(boost) => json!({ "term": { field: { "value": value, "boost": boost } } }),
                None => json!({ "term": { field: value } }),
            },
            Query::Range(range) => {
                let mut bounds = Map::new();
                for (name, bound) in [
                    ("gt", range.gt),
                    ("gte", range.gte),
                    ("lt", range.lt),
                    ("lte", range.lte),
                ] {
                    if let Some(bound) = bound {
                        bounds.insert(name.to_string(), json!(bound));
                    }
                }
                json!({ "range": { &range.field: bounds } })
            }
            Query::SimpleQueryString(sqs) => {
                let fields: Vec<String> = sqs
                    .fields
                    .iter()
                    .map(|(name, boost)| format!("{}^{}", name, boost))
                    .collect();
                let flags: Vec<&str> = sqs.flags.iter().map(QueryFlag::as_str).collect();
                let mut body = json!({
                    "query": sqs.query,
                    "fields": fields,
                    "default_operator": sqs.default_operator.as_str(),
                    "flags": flags.join("|"),
                });
                if let Some(msm) = &sqs.minimum_should_match {
                    body["minimum_should_match"] = json!(msm);
                }
                json!({ "simple_query_string": body })
            }
            Query::Match(m) => {
                let mut body = json!({ "query": m.query, "boost": m.boost });
                if m.fuzzy {
                    body["fuzziness"] = json!("AUTO");
                }
                json!({ "match": { &m.field: body } })
            }
            Query::MatchPhrase(p) => json!({
                "match_phrase": {
                    &p.field: { "query": p.query, "slop": p.slop, "boost": p.boost }
                }
            }),
            Query::Bool(b) => b.to_json(),
            Query::FunctionScore { query, functions } => {
                let functions: Vec<Value> = functions
                    .iter()
                    .map(|f| {
                        let mut fvf = json!({
                            "field": f.field,
                            "factor": f.factor,
                            "modifier": f.modifier.as_str(),
                        });
                        if let Some(missing) = f.missing {
                            fvf["missing"] = json!(missing);
                        }
                        json!({ "field_value_factor": fvf })
                    })
                    .collect();
                json!({
                    "function_score": {
                        "query": query.to_json(),
                        "functions": functions,
                        "score_mode": "multiply",
                        "boost_mode": "multiply",
                    }
                })
            }
            Query::Boosting {
                positive,
                negative,
                negative_boost,
            } => json!({
                "boosting": {
                    "positive": positive.to_json(),
                    "negative": negative.to_json(),
                    "negative_boost": negative_boost,
                }
            }),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
