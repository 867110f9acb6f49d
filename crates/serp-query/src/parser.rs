//! Query string parsing.
//!
//! Extracts `keyword:value` directives from the raw user input and rewrites
//! informal boolean operators into the simple query string syntax. Parsing is
//! a pure function of the input text and the directive table.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use serp_types::QueryFilter;

use crate::fields::{HOSTNAME_RAW_FIELD, LANGUAGE_FIELD};

/// Control field that switches the searched indices.
pub const INDEX_CONTROL_FIELD: &str = "#index";

static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"| AND | OR "#).expect("operator pattern is valid"));

/// One extracted `keyword:value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Target field, or a `#`-prefixed control name
    pub field: String,
    pub value: String,
    /// Written with a leading `-`
    pub negate: bool,
}

impl Directive {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            negate: false,
        }
    }

    /// Control directives steer the request instead of filtering documents.
    pub fn is_control(&self) -> bool {
        self.field.is_empty() || self.field.starts_with('#')
    }
}

/// Result of parsing one raw query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Free text left after removing directives, operators normalized
    pub residual_text: String,
    /// Directives in text order
    pub directives: Vec<Directive>,
    pub language_override: Option<String>,
    /// Candidate indices from `#index` directives
    pub index_override: Option<Vec<String>>,
    pub grouping_suppressed: bool,
}

impl ParsedQuery {
    /// Directives that become term filters.
    pub fn filters(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| !d.is_control())
    }

    /// Values of all control directives for `field`.
    pub fn control_values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.directives
            .iter()
            .filter(move |d| d.is_control() && d.field == field)
            .map(|d| d.value.as_str())
    }
}

/// Directive-aware query string parser.
#[derive(Debug, Clone)]
pub struct QueryStringParser {
    rules: Vec<(QueryFilter, Regex)>,
}

impl QueryStringParser {
    /// Compile one matcher per configured directive keyword.
    pub fn new(filters: &[QueryFilter]) -> Self {
        let rules = filters
            .iter()
            .filter(|f| !f.keyword.trim().is_empty())
            .filter_map(|f| {
                let pattern = format!(r"(?:^|\s)(-?){}:(\S+)", regex::escape(f.keyword.trim()));
                match Regex::new(&pattern) {
                    Ok(re) => Some((f.clone(), re)),
                    Err(e) => {
                        warn!(keyword = %f.keyword, error = %e, "Skipping unusable query filter");
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// Parse a raw query string.
    pub fn parse(&self, text: &str) -> ParsedQuery {
        // (start, end, rule, negate, value)
        let mut matches: Vec<(usize, usize, usize, bool, String)> = Vec::new();
        for (rule_idx, (_, re)) in self.rules.iter().enumerate() {
            for caps in re.captures_iter(text) {
                let (Some(whole), Some(value)) = (caps.get(0), caps.get(2)) else {
                    continue;
                };
                let negate = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
                matches.push((
                    whole.start(),
                    whole.end(),
                    rule_idx,
                    negate,
                    value.as_str().trim().to_string(),
                ));
            }
        }
        matches.sort_by_key(|m| m.0);

        let mut parsed = ParsedQuery::default();
        let mut residual = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, rule_idx, negate, value) in matches {
            if start < cursor {
                continue;
            }
            residual.push_str(&text[cursor..start]);
            residual.push(' ');
            cursor = end;

            let field = self.rules[rule_idx].0.field.trim().to_string();
            self.record(&mut parsed, Directive { field, value, negate });
        }
        residual.push_str(&text[cursor..]);

        let collapsed = residual.split_whitespace().collect::<Vec<_>>().join(" ");
        parsed.residual_text = normalize_operators(&collapsed);

        debug!(
            residual = %parsed.residual_text,
            directives = parsed.directives.len(),
            grouping_suppressed = parsed.grouping_suppressed,
            "Parsed query string"
        );
        parsed
    }

    fn record(&self, parsed: &mut ParsedQuery, directive: Directive) {
        if directive.is_control() {
            if directive.field == INDEX_CONTROL_FIELD {
                let indices: Vec<String> = directive
                    .value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                parsed.index_override = Some(indices);
            }
        } else if !directive.negate {
            if directive.field == LANGUAGE_FIELD {
                parsed.language_override = Some(directive.value.clone());
            }
            if directive.field == HOSTNAME_RAW_FIELD {
                parsed.grouping_suppressed = true;
            }
        }
        parsed.directives.push(directive);
    }
}

/// Rewrite ` AND ` to ` + ` and ` OR ` to ` | ` outside double quotes.
pub fn normalize_operators(text: &str) -> String {
    OPERATOR_RE
        .replace_all(text, |caps: &Captures| match &caps[0] {
            " AND " => " + ".to_string(),
            " OR " => " | ".to_string(),
            quoted => quoted.to_string(),
        })
        .into_owned()
}
