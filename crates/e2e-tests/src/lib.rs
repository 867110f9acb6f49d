//! End-to-end test infrastructure for serp.
//!
//! Provides a shared TestHarness that wires a pipeline from a TOML
//! configuration fixture to a [`MockBackend`], plus hit builders.

use std::sync::Arc;

use serde_json::{json, Value};

use serp_search::{BackendResponse, MockBackend, RawHit, SearchPipeline};
use serp_types::{ConfigProvider, Settings};

/// Configuration used by most end-to-end tests.
pub const TEST_CONFIG: &str = r##"
log_level = "debug"

[cluster]
host = "http://localhost:9200"
indices = ["cw09", "cw12", "cc1511"]
default_indices = ["cw12"]

[[cluster.index_aliases]]
index = "webis_warc_clueweb09_003"
alias = "cw09"
display_name = "ClueWeb09"

[[cluster.index_aliases]]
index = "webis_warc_clueweb12_011"
alias = "cw12"
display_name = "ClueWeb12"

[[cluster.index_aliases]]
index = "webis_warc_commoncrawl15_002"
alias = "cc1511"
display_name = "CommonCrawl 11/2015"

[search]
default_language = "en"

[[search.default_simple.main_fields]]
name = "title_lang.%lang%"
boost = 20.0
proximity_matching = true
proximity_boost = 30.0

[[search.default_simple.main_fields]]
name = "body_lang.%lang%"
fuzzy_matching = true

[[search.default_simple.main_fields]]
name = "warc_target_hostname"
boost = 5.0

[[search.default_simple.range_filters]]
name = "spam_rank"
gte = 60.0

[[search.default_simple.boosts]]
name = "warc_target_path.raw"
value = "/"
match = true
match_boost = 3.0

[[search.default_simple.field_value_factors]]
name = "page_rank"
factor = 1.0
modifier = "log1p"
missing = 0.0

[search.default_simple.penalties]
penalty_factor = 0.5

[[search.default_simple.penalties.fields]]
name = "warc_target_path_ext"
value = "txt"
boost = 1.0

[[search.default_simple.query_filters]]
keyword = "site"
field = "warc_target_hostname.raw"

[[search.default_simple.query_filters]]
keyword = "lang"
field = "lang"

[[search.default_simple.query_filters]]
keyword = "index"
field = "#index"

[search.phrase_search]
slop = 1
max_slop = 2

[[search.phrase_search.fields]]
name = "title_lang.%lang%"
boost = 10.0

[[search.phrase_search.fields]]
name = "body_lang.%lang%"

[serp.pagination]
results_per_page = 10
"##;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    pub settings: Settings,
    pub backend: Arc<MockBackend>,
    pub pipeline: SearchPipeline,
}

impl TestHarness {
    /// Harness over [`TEST_CONFIG`] whose backend finds nothing.
    pub fn new() -> Self {
        Self::with_backend(MockBackend::empty())
    }

    /// Harness over [`TEST_CONFIG`] returning the given hits.
    pub fn with_hits(hits: Vec<RawHit>, total: i64) -> Self {
        Self::with_backend(MockBackend::new(BackendResponse {
            hits,
            total,
            elapsed_nanos: 4_200_000,
        }))
    }

    pub fn with_backend(backend: MockBackend) -> Self {
        Self::from_parts(TEST_CONFIG, backend)
    }

    /// Harness over an arbitrary TOML configuration.
    pub fn from_parts(config: &str, backend: MockBackend) -> Self {
        let settings = ConfigProvider::from_toml_str(config)
            .and_then(|provider| provider.settings())
            .expect("Failed to load test configuration");
        let backend = Arc::new(backend);
        let pipeline = SearchPipeline::new(&settings, backend.clone());
        Self {
            settings,
            backend,
            pipeline,
        }
    }

    /// Body of the last request the backend received.
    pub async fn last_body(&self) -> Value {
        self.backend
            .last_request()
            .await
            .expect("Backend received no request")
            .to_body()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a ClueWeb12 hit for `host`.
pub fn create_hit(id: &str, host: &str) -> RawHit {
    let source = json!({
        "warc_trec_id": format!("clueweb12-0000tw-00-{:0>5}", id),
        "title_lang.en": format!("Page {} on {}", id, host),
        "meta_desc_lang.en": format!("Description of page {}", id),
        "warc_target_hostname": host,
        "warc_target_path": "/",
        "warc_target_uri": format!("https://{}/{}", host, id),
        "spam_rank": 80,
        "page_rank": 0.001,
    });
    RawHit {
        index: "webis_warc_clueweb12_011".to_string(),
        id: id.to_string(),
        score: Some(10.0),
        source: source.as_object().cloned().unwrap_or_default(),
        ..Default::default()
    }
}

/// Create hits in order, one per host entry.
pub fn create_hits(hosts: &[&str]) -> Vec<RawHit> {
    hosts
        .iter()
        .enumerate()
        .map(|(i, host)| create_hit(&(i + 1).to_string(), host))
        .collect()
}

/// Collect every `match_phrase` slop in a rendered query.
pub fn phrase_slops(value: &Value) -> Vec<u64> {
    let mut slops = Vec::new();
    collect_slops(value, &mut slops);
    slops
}

fn collect_slops(value: &Value, out: &mut Vec<u64>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "match_phrase" {
                    if let Some(fields) = child.as_object() {
                        out.extend(fields.values().filter_map(|f| f["slop"].as_u64()));
                    }
                } else {
                    collect_slops(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_slops(item, out)),
        _ => {}
    }
}
