//! Backend search request.

use serde_json::{json, Map, Value};

use serp_query::{FieldHighlightSpec, Query};

/// Everything the backend needs to run one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Backend index names (aliases already resolved)
    pub indices: Vec<String>,
    pub pre_query: Query,
    pub rescore_query: Option<Query>,
    pub from: u64,
    pub size: u64,
    pub explain: bool,
    /// Per-shard document limit (`terminate_after`)
    pub node_limit: u64,
    pub rescore_window: u32,
    pub highlighters: Vec<FieldHighlightSpec>,
    /// `_source` fields left out of the response
    pub source_excludes: Vec<String>,
}

impl SearchRequest {
    /// Comma-joined index list for the request path.
    pub fn index_path(&self) -> String {
        self.indices.join(",")
    }

    /// Render the backend request body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.pre_query.to_json());
        body.insert("from".to_string(), json!(self.from));
        body.insert("size".to_string(), json!(self.size));
        body.insert("explain".to_string(), json!(self.explain));
        body.insert("terminate_after".to_string(), json!(self.node_limit));

        if let Some(rescore) = &self.rescore_query {
            body.insert(
                "rescore".to_string(),
                json!({
                    "window_size": self.rescore_window,
                    "query": {
                        "rescore_query": rescore.to_json(),
                        "query_weight": 0.0,
                        "rescore_query_weight": 1.0,
                        "score_mode": "total"
                    }
                }),
            );
        }

        if !self.highlighters.is_empty() {
            let fields: Map<String, Value> = self
                .highlighters
                .iter()
                .map(|spec| {
                    (
                        spec.field.clone(),
                        json!({
                            "fragment_size": spec.fragment_size,
                            "number_of_fragments": spec.number_of_fragments
                        }),
                    )
                })
                .collect();
            body.insert(
                "highlight".to_string(),
                json!({ "encoder": "html", "fields": fields }),
            );
        }

        if !self.source_excludes.is_empty() {
            body.insert(
                "_source".to_string(),
                json!({ "excludes": self.source_excludes }),
            );
        }

        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SearchRequest {
        SearchRequest {
            indices: vec!["cw12".to_string(), "cc1511".to_string()],
            pre_query: Query::MatchAll,
            rescore_query: None,
            from: 20,
            size: 10,
            explain: false,
            node_limit: 200_000,
            rescore_window: 400,
            highlighters: Vec::new(),
            source_excludes: Vec::new(),
        }
    }

    #[test]
    fn test_minimal_body() {
        let body = request().to_body();
        assert_eq!(body["from"], 20);
        assert_eq!(body["size"], 10);
        assert_eq!(body["explain"], false);
        assert_eq!(body["terminate_after"], 200_000);
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert!(body.get("rescore").is_none());
        assert!(body.get("highlight").is_none());
        assert!(body.get("_source").is_none());
    }

    #[test]
    fn test_rescore_and_highlight_sections() {
        let mut request = request();
        request.rescore_query = Some(Query::term("lang", "en"));
        request.highlighters = vec![
            FieldHighlightSpec::new("title_lang.en", 0, 0),
            FieldHighlightSpec::new("body_lang.en", 300, 1),
        ];
        request.source_excludes = vec!["body_lang.*".to_string()];

        let body = request.to_body();
        let rescore = &body["rescore"];
        assert_eq!(rescore["window_size"], 400);
        assert_eq!(rescore["query"]["query_weight"], 0.0);
        assert_eq!(rescore["query"]["rescore_query_weight"], 1.0);
        assert_eq!(rescore["query"]["score_mode"], "total");
        assert_eq!(
            rescore["query"]["rescore_query"],
            Query::term("lang", "en").to_json()
        );

        assert_eq!(body["highlight"]["encoder"], "html");
        assert_eq!(
            body["highlight"]["fields"]["body_lang.en"],
            json!({ "fragment_size": 300, "number_of_fragments": 1 })
        );
        assert_eq!(body["_source"]["excludes"], json!(["body_lang.*"]));
    }

    #[test]
    fn test_index_path() {
        assert_eq!(request().index_path(), "cw12,cc1511");
    }
}
