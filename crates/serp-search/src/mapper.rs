//! Mapping raw backend hits to search results.
//!
//! Extracts display fields, builds snippets and marks runs of consecutive
//! results from the same host so a frontend can group them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use serp_query::fields::{
    localized, BODY_FIELD, HOSTNAME_FIELD, META_DESC_FIELD, PAGE_RANK_FIELD, PATH_FIELD,
    SPAM_RANK_FIELD, TITLE_FIELD, TREC_ID_FIELD, URI_FIELD,
};
use serp_query::IndexSelector;

use crate::backend::RawHit;

/// Maximum snippet length when no highlight is available.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Separator between highlight fragments.
pub const FRAGMENT_SEPARATOR: &str = " … ";

/// Node of a score explanation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub description: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Explanation>,
}

impl Explanation {
    /// Convert the backend `_explanation` object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            value: obj.get("value").and_then(Value::as_f64).unwrap_or(0.0),
            children: obj
                .get("details")
                .and_then(Value::as_array)
                .map(|details| details.iter().filter_map(Explanation::from_json).collect())
                .unwrap_or_default(),
        })
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub score: f64,
    /// Raw backend index
    pub index: String,
    pub display_index: String,
    pub document_id: String,
    pub trec_id: Option<String>,
    pub title: String,
    pub spam_rank: Option<i64>,
    pub page_rank: Option<f64>,
    pub target_hostname: String,
    pub target_path: String,
    pub target_uri: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_body: Option<String>,
    /// First of a run of results from the same host
    pub more_suggested: bool,
    /// Same host as the previous result
    pub grouping_suggested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

/// Converts raw hits for one request.
#[derive(Debug, Clone)]
pub struct ResultMapper<'a> {
    selector: &'a IndexSelector,
    language: &'a str,
    explain: bool,
    full_body: bool,
    grouping: bool,
}

impl<'a> ResultMapper<'a> {
    pub fn new(selector: &'a IndexSelector, language: &'a str) -> Self {
        Self {
            selector,
            language,
            explain: false,
            full_body: false,
            grouping: true,
        }
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_full_body(mut self, full_body: bool) -> Self {
        self.full_body = full_body;
        self
    }

    /// Enable or disable same-host grouping hints.
    pub fn with_grouping(mut self, grouping: bool) -> Self {
        self.grouping = grouping;
        self
    }

    /// Map hits, preserving their order.
    pub fn map(&self, hits: &[RawHit]) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = hits.iter().map(|hit| self.map_hit(hit)).collect();
        if self.grouping {
            mark_groups(&mut results);
        }
        results
    }

    fn map_hit(&self, hit: &RawHit) -> SearchResult {
        let title_field = localized(TITLE_FIELD, self.language);
        let body_field = localized(BODY_FIELD, self.language);
        let meta_field = localized(META_DESC_FIELD, self.language);

        let target_uri = source_str(&hit.source, URI_FIELD).unwrap_or_default();

        let title = hit
            .highlight
            .get(&title_field)
            .filter(|fragments| !fragments.is_empty())
            .map(|fragments| fragments.join(FRAGMENT_SEPARATOR))
            .or_else(|| source_str(&hit.source, &title_field))
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| target_uri.clone());

        let body = source_str(&hit.source, &body_field);
        let snippet = match hit.highlight.get(&body_field) {
            Some(fragments) if !fragments.is_empty() => fragments.join(FRAGMENT_SEPARATOR),
            _ => {
                let fallback = source_str(&hit.source, &meta_field)
                    .filter(|desc| !desc.trim().is_empty())
                    .or_else(|| body.clone())
                    .unwrap_or_default();
                truncate_at_word(&fallback, SNIPPET_MAX_CHARS)
            }
        };

        SearchResult {
            score: hit.score.unwrap_or(0.0),
            index: hit.index.clone(),
            display_index: self.selector.display_name(&hit.index),
            document_id: hit.id.clone(),
            trec_id: source_str(&hit.source, TREC_ID_FIELD),
            title,
            spam_rank: source_value(&hit.source, SPAM_RANK_FIELD).and_then(|v| {
                v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))
            }),
            page_rank: source_value(&hit.source, PAGE_RANK_FIELD).and_then(Value::as_f64),
            target_hostname: source_str(&hit.source, HOSTNAME_FIELD).unwrap_or_default(),
            target_path: source_str(&hit.source, PATH_FIELD).unwrap_or_default(),
            target_uri,
            snippet,
            full_body: if self.full_body { body } else { None },
            more_suggested: false,
            grouping_suggested: false,
            explanation: if self.explain {
                hit.explanation.as_ref().and_then(Explanation::from_json)
            } else {
                None
            },
        }
    }
}

/// Look up a stored field by flat dotted key, then by nested path.
fn source_value<'v>(source: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    if let Some(value) = source.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = source.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

fn source_str(source: &Map<String, Value>, path: &str) -> Option<String> {
    source_value(source, path).and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Hostname used for grouping.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Set `grouping_suggested` and `more_suggested` on consecutive same-host runs.
pub fn mark_groups(results: &mut [SearchResult]) {
    let hosts: Vec<String> = results
        .iter()
        .map(|r| normalize_host(&r.target_hostname))
        .collect();

    for i in 0..results.len() {
        results[i].grouping_suggested = i > 0 && !hosts[i].is_empty() && hosts[i] == hosts[i - 1];
    }
    for i in 0..results.len() {
        let next_grouped = results.get(i + 1).is_some_and(|r| r.grouping_suggested);
        results[i].more_suggested = next_grouped && !results[i].grouping_suggested;
    }
}

/// Cut text to at most `max_chars` characters, backing up to a word boundary.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => cut[..pos].trim_end().to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use serp_types::IndexAlias;

    fn selector() -> IndexSelector {
        IndexSelector::new(
            vec!["cw12".to_string()],
            Vec::new(),
            vec![IndexAlias {
                index: "webis_warc_clueweb12_011".to_string(),
                alias: "cw12".to_string(),
                display_name: Some("ClueWeb12".to_string()),
            }],
        )
    }

    fn hit(id: &str, host: &str) -> RawHit {
        let source = json!({
            "warc_trec_id": format!("clueweb12-{}", id),
            "title_lang.en": format!("Title {}", id),
            "warc_target_hostname": host,
            "warc_target_path": "/",
            "warc_target_uri": format!("https://{}/", host),
            "spam_rank": 87,
            "page_rank": 1.25e-9,
            "body_lang.en": "Body text",
        });
        RawHit {
            index: "webis_warc_clueweb12_011".to_string(),
            id: id.to_string(),
            score: Some(2.0),
            source: source.as_object().cloned().unwrap(),
            ..Default::default()
        }
    }

    fn flags(results: &[SearchResult]) -> Vec<(bool, bool)> {
        results
            .iter()
            .map(|r| (r.grouping_suggested, r.more_suggested))
            .collect()
    }

    #[test]
    fn test_map_stored_fields() {
        let selector = selector();
        let results = ResultMapper::new(&selector, "en").map(&[hit("1", "example.org")]);
        let result = &results[0];

        assert_eq!(result.display_index, "ClueWeb12");
        assert_eq!(result.trec_id.as_deref(), Some("clueweb12-1"));
        assert_eq!(result.title, "Title 1");
        assert_eq!(result.spam_rank, Some(87));
        assert_eq!(result.page_rank, Some(1.25e-9));
        assert_eq!(result.target_uri, "https://example.org/");
        assert_eq!(result.snippet, "Body text");
        assert_eq!(result.full_body, None);
        assert_eq!(result.explanation, None);
    }

    #[test]
    fn test_highlights_take_precedence() {
        let mut raw = hit("1", "example.org");
        raw.highlight.insert(
            "body_lang.en".to_string(),
            vec!["first <em>hit</em>".to_string(), "second".to_string()],
        );
        raw.highlight
            .insert("title_lang.en".to_string(), vec!["<em>Title</em> 1".to_string()]);

        let selector = selector();
        let result = &ResultMapper::new(&selector, "en").map(&[raw])[0];
        assert_eq!(result.snippet, "first <em>hit</em> … second");
        assert_eq!(result.title, "<em>Title</em> 1");
    }

    #[test]
    fn test_snippet_prefers_meta_description() {
        let mut raw = hit("1", "example.org");
        raw.source
            .insert("meta_desc_lang.en".to_string(), json!("A description"));

        let selector = selector();
        let result = &ResultMapper::new(&selector, "en").map(&[raw])[0];
        assert_eq!(result.snippet, "A description");
    }

    #[test]
    fn test_title_falls_back_to_uri() {
        let mut raw = hit("1", "example.org");
        raw.source.remove("title_lang.en");

        let selector = selector();
        let result = &ResultMapper::new(&selector, "en").map(&[raw])[0];
        assert_eq!(result.title, "https://example.org/");
    }

    #[test]
    fn test_nested_source_lookup() {
        let mut raw = hit("1", "example.org");
        raw.source.remove("title_lang.en");
        raw.source
            .insert("title_lang".to_string(), json!({ "en": "Nested title" }));

        let selector = selector();
        let result = &ResultMapper::new(&selector, "en").map(&[raw])[0];
        assert_eq!(result.title, "Nested title");
    }

    #[test]
    fn test_grouping_runs() {
        let hits = vec![
            hit("1", "a.org"),
            hit("2", "www.A.org"),
            hit("3", "a.org"),
            hit("4", "b.org"),
            hit("5", "c.org"),
            hit("6", "c.org"),
        ];
        let selector = selector();
        let results = ResultMapper::new(&selector, "en").map(&hits);

        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(
            flags(&results),
            vec![
                (false, true),
                (true, false),
                (true, false),
                (false, false),
                (false, true),
                (true, false),
            ]
        );
    }

    #[test]
    fn test_grouping_disabled() {
        let hits = vec![hit("1", "a.org"), hit("2", "a.org")];
        let selector = selector();
        let results = ResultMapper::new(&selector, "en")
            .with_grouping(false)
            .map(&hits);
        assert_eq!(flags(&results), vec![(false, false), (false, false)]);
    }

    #[test]
    fn test_explanation_only_when_requested() {
        let mut raw = hit("1", "a.org");
        raw.explanation = Some(json!({
            "value": 2.0,
            "description": "sum of:",
            "details": [{ "value": 2.0, "description": "weight(body)", "details": [] }]
        }));

        let selector = selector();
        let plain = &ResultMapper::new(&selector, "en").map(&[raw.clone()])[0];
        assert_eq!(plain.explanation, None);

        let explained = &ResultMapper::new(&selector, "en")
            .with_explain(true)
            .map(&[raw])[0];
        let explanation = explained.explanation.as_ref().unwrap();
        assert_eq!(explanation.description, "sum of:");
        assert_eq!(explanation.children.len(), 1);
        assert_eq!(explanation.children[0].description, "weight(body)");
    }

    #[test]
    fn test_full_body_on_request() {
        let selector = selector();
        let result = &ResultMapper::new(&selector, "en")
            .with_full_body(true)
            .map(&[hit("1", "a.org")])[0];
        assert_eq!(result.full_body.as_deref(), Some("Body text"));
    }

    #[test]
    fn test_truncate_at_word() {
        assert_eq!(truncate_at_word("short text", 200), "short text");
        assert_eq!(truncate_at_word("hello wonderful world", 12), "hello");
        assert_eq!(truncate_at_word("abcdefghij", 4), "abcd");

        let long = "wörd ".repeat(100);
        let cut = truncate_at_word(&long, SNIPPET_MAX_CHARS);
        assert!(cut.chars().count() <= SNIPPET_MAX_CHARS);
        assert!(cut.ends_with("wörd"));
    }
}
