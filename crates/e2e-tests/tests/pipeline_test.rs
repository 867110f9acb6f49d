//! End-to-end pipeline tests for serp.
//!
//! Raw query string -> parser -> index selection -> query strategy -> mock
//! backend -> result mapping -> pagination.

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{create_hits, phrase_slops, TestHarness};
use serp_search::{strategy_for, ApiResponse, NavEntry, SearchParams};

#[tokio::test]
async fn test_default_keyword_search_request() {
    let harness = TestHarness::new();
    let page = harness
        .pipeline
        .search(&SearchParams::new("test"), &harness.pipeline.simple_strategy())
        .await
        .unwrap();

    assert_eq!(page.effective_indices, vec!["cw12".to_string()]);
    assert_eq!(page.language, "en");

    let request = harness.backend.last_request().await.unwrap();
    assert_eq!(request.indices, vec!["webis_warc_clueweb12_011".to_string()]);

    let body = request.to_body();
    assert_eq!(body["from"], 0);
    assert_eq!(body["size"], 10);
    assert_eq!(body["terminate_after"], 200_000);

    let filters = body["query"]["bool"]["filter"].as_array().unwrap();
    assert!(filters.contains(&json!({ "term": { "lang": "en" } })));
    assert!(filters.contains(&json!({ "range": { "spam_rank": { "gte": 60.0 } } })));
    assert_eq!(
        body["query"]["bool"]["should"],
        json!([{ "term": { "warc_target_path.raw": { "value": "/", "boost": 3.0 } } }])
    );
}

#[tokio::test]
async fn test_rescore_section_is_decorated() {
    let harness = TestHarness::new();
    harness
        .pipeline
        .search(&SearchParams::new("rust book"), &harness.pipeline.simple_strategy())
        .await
        .unwrap();

    let body = harness.last_body().await;
    let rescore = &body["rescore"];
    assert_eq!(rescore["window_size"], 400);

    let boosting = &rescore["query"]["rescore_query"]["boosting"];
    assert_eq!(boosting["negative_boost"], 0.5);
    assert_eq!(
        boosting["negative"],
        json!({ "bool": { "should": [
            { "term": { "warc_target_path_ext": { "value": "txt", "boost": 1.0 } } }
        ] } })
    );

    let function_score = &boosting["positive"]["function_score"];
    assert_eq!(
        function_score["functions"],
        json!([{ "field_value_factor": {
            "field": "page_rank", "factor": 1.0, "modifier": "log1p", "missing": 0.0
        } }])
    );
    let sqs = &function_score["query"]["bool"]["must"][0]["simple_query_string"];
    assert_eq!(sqs["minimum_should_match"], "30%");
    assert_eq!(sqs["default_operator"], "or");
    assert_eq!(phrase_slops(&function_score["query"]), vec![3]);

    assert_eq!(
        body["highlight"]["fields"]["title_lang.en"],
        json!({ "fragment_size": 0, "number_of_fragments": 0 })
    );
}

#[tokio::test]
async fn test_out_of_range_page_is_clamped() {
    let hits = create_hits(&["a.org", "b.org", "c.org", "d.org", "e.org"]);
    let harness = TestHarness::with_hits(hits, 5);

    let page = harness
        .pipeline
        .search(
            &SearchParams::new("test").with_page(999_999),
            &harness.pipeline.simple_strategy(),
        )
        .await
        .unwrap();

    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_pages, 1);
    assert!(!page
        .navigation
        .iter()
        .any(|e| matches!(e, NavEntry::Next { .. })));

    // first request goes out at the capped offset, the second at the last real page
    let requests = harness.backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].from, 9_990);
    assert_eq!(requests[1].from, 0);

    let ids: Vec<&str> = page.results.iter().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(page.results.len() as u64, page.total_results);
}

#[tokio::test]
async fn test_phrase_slop_is_clamped() {
    let harness = TestHarness::new();
    let mut strategy = harness.pipeline.phrase_strategy();
    assert_eq!(strategy.slop(), 1);
    strategy.set_slop(50);

    harness
        .pipeline
        .search(&SearchParams::new("\"hello world\""), &strategy)
        .await
        .unwrap();

    let body = harness.last_body().await;
    assert_eq!(body["terminate_after"], 10_000);
    assert_eq!(phrase_slops(&body["query"]), vec![2, 2]);
    assert_eq!(
        body["query"]["bool"]["must"][0]["match_phrase"]["title_lang.en"]["query"],
        "hello world"
    );
}

#[tokio::test]
async fn test_site_directive_filters_and_suppresses_grouping() {
    let hits = create_hits(&["example.org", "example.org", "example.org"]);
    let harness = TestHarness::with_hits(hits, 3);

    let page = harness
        .pipeline
        .search(
            &SearchParams::new("site:example.org test"),
            &harness.pipeline.simple_strategy(),
        )
        .await
        .unwrap();

    assert_eq!(page.query, "test");
    assert!(page
        .results
        .iter()
        .all(|r| !r.grouping_suggested && !r.more_suggested));

    let body = harness.last_body().await;
    assert_eq!(
        body["query"]["bool"]["filter"][0],
        json!({ "term": { "warc_target_hostname.raw": "example.org" } })
    );
    assert_eq!(
        body["query"]["bool"]["must"][0]["simple_query_string"]["query"],
        "test"
    );
}

#[tokio::test]
async fn test_grouping_hints_in_result_order() {
    let hits = create_hits(&["a.org", "www.a.org", "b.org", "c.org", "c.org"]);
    let harness = TestHarness::with_hits(hits, 5);

    let page = harness
        .pipeline
        .search(&SearchParams::new("test"), &harness.pipeline.simple_strategy())
        .await
        .unwrap();

    let ids: Vec<&str> = page.results.iter().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

    let grouping: Vec<bool> = page.results.iter().map(|r| r.grouping_suggested).collect();
    let more: Vec<bool> = page.results.iter().map(|r| r.more_suggested).collect();
    assert_eq!(grouping, vec![false, true, false, false, true]);
    assert_eq!(more, vec![true, false, false, true, false]);

    assert_eq!(page.results[0].display_index, "ClueWeb12");
    assert_eq!(page.results[0].snippet, "Description of page 1");
}

#[tokio::test]
async fn test_index_and_language_directives() {
    let harness = TestHarness::new();
    let page = harness
        .pipeline
        .search(
            &SearchParams::new("hallo welt lang:de index:cw09,bogus,cc1511"),
            &harness.pipeline.simple_strategy(),
        )
        .await
        .unwrap();

    assert_eq!(page.language, "de");
    assert_eq!(page.query, "hallo welt");
    assert_eq!(
        page.effective_indices,
        vec!["cw09".to_string(), "cc1511".to_string()]
    );

    let request = harness.backend.last_request().await.unwrap();
    assert_eq!(request.index_path(), "webis_warc_clueweb09_003,webis_warc_commoncrawl15_002");

    let body = request.to_body();
    let filters = body["query"]["bool"]["filter"].as_array().unwrap();
    assert!(filters.contains(&json!({ "term": { "lang": "de" } })));
    assert_eq!(
        body["query"]["bool"]["must"][0]["simple_query_string"]["fields"][0],
        "title_lang.de^20"
    );
}

#[tokio::test]
async fn test_operator_normalization_reaches_backend() {
    let harness = TestHarness::new();
    harness
        .pipeline
        .search(
            &SearchParams::new("cats AND dogs OR \"birds AND bees\""),
            &harness.pipeline.simple_strategy(),
        )
        .await
        .unwrap();

    let body = harness.last_body().await;
    assert_eq!(
        body["query"]["bool"]["must"][0]["simple_query_string"]["query"],
        "cats + dogs | \"birds AND bees\""
    );
}

#[tokio::test]
async fn test_routes_select_strategy() {
    let harness = TestHarness::new();
    let strategy = strategy_for("/api/v1/_phrases", harness.pipeline.search_settings()).unwrap();
    assert_eq!(strategy.name(), "phrase");

    harness
        .pipeline
        .search(&SearchParams::new("exact words"), strategy.as_ref())
        .await
        .unwrap();

    let body = harness.last_body().await;
    assert_eq!(phrase_slops(&body["query"]), vec![1, 1]);
}

#[tokio::test]
async fn test_api_response_shape() {
    let harness = TestHarness::with_hits(create_hits(&["a.org"]), 1);
    let page = harness
        .pipeline
        .search(
            &SearchParams::new("test").with_explain(true),
            &harness.pipeline.simple_strategy(),
        )
        .await
        .unwrap();

    let body = serde_json::to_value(ApiResponse::from_page(&page, false)).unwrap();
    assert_eq!(body["meta"]["query_time_ms"], 4);
    assert_eq!(body["meta"]["total_results"], 1);
    assert_eq!(body["meta"]["indices"], json!(["cw12"]));
    assert_eq!(body["results"][0]["index"], "ClueWeb12");

    let minimal = serde_json::to_value(ApiResponse::from_page(&page, true)).unwrap();
    assert!(minimal["results"][0].get("snippet").is_none());
    assert_eq!(minimal["results"][0]["target_uri"], "https://a.org/1");
}
