//! Clarivate sync end to end against a mock Web of Science Journals API

use httpmock::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;

use vqi_builder::clients::ClarivateClient;
use vqi_builder::error::{BuildError, FetchError};
use vqi_builder::index::{IndexEntry, MetricValue};
use vqi_builder::pipeline::{sync_clarivate, ClarivateOptions};
use vqi_builder::utils::RetryPolicy;
use vqi_common::config::ClarivateSettings;

fn settings() -> ClarivateSettings {
    ClarivateSettings {
        page_size: 2,
        workers: 2,
        retries: 1,
        requests_per_second: 1000,
        ..ClarivateSettings::default()
    }
}

fn options(year: u32, with_reports: bool) -> ClarivateOptions {
    let fast = RetryPolicy {
        retries: 1,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    };
    let mut options = ClarivateOptions::from_settings(year, &settings());
    options.with_reports = with_reports;
    options.listing_retry = fast;
    options.enrich.retry = fast;
    options
}

fn client(server: &MockServer) -> ClarivateClient {
    ClarivateClient::new("test-key", &settings())
        .unwrap()
        .with_base_url(server.base_url())
}

fn report(name: &str, jif: Value, quartiles: &[&str]) -> Value {
    let ranks: Vec<Value> = quartiles.iter().map(|q| json!({"quartile": q})).collect();
    json!({
        "journal": {"name": name},
        "metrics": {"impactMetrics": {"jif": jif}},
        "ranks": {"jif": ranks}
    })
}

async fn mock_listing(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/last-updated");
            then.status(200).json_body(json!({"lastUpdated": "2024-06-18"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/journals")
                .query_param("jcrYear", "2023")
                .query_param("page", "1")
                .query_param("limit", "2");
            then.status(200).json_body(json!({
                "metadata": {"total": 3},
                "hits": [{"id": "A", "name": "Journal A"}, {"id": "B", "name": "Journal B"}]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/journals")
                .query_param("jcrYear", "2023")
                .query_param("page", "2");
            then.status(200).json_body(json!({
                "metadata": {"total": 3},
                "hits": [{"id": "C", "name": "Journal C"}]
            }));
        })
        .await;
}

#[tokio::test]
async fn test_listing_only() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;

    let sync = sync_clarivate(&client(&server), &options(2023, false)).await.unwrap();

    assert_eq!(sync.journals.len(), 3);
    assert_eq!(sync.journals[2]["id"], "C");
    assert!(sync.snapshot.is_empty());
    assert!(sync.errors.is_empty());
    assert_eq!(sync.meta.journal_count, Some(3));
    assert_eq!(sync.meta.with_reports, Some(false));
    assert_eq!(sync.meta.error_count, None);
    assert_eq!(sync.meta.last_updated, Some(json!({"lastUpdated": "2024-06-18"})));
}

#[tokio::test]
async fn test_reports_are_indexed_and_failures_reported() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/journals/A/reports/year/2023");
            then.status(200)
                .json_body(report("Journal A & Letters", json!("3.5"), &["Q2", "Q1"]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/journals/B/reports/year/2023");
            then.status(200).json_body(report("Journal B", json!(1.25), &["Q4"]));
        })
        .await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/journals/C/reports/year/2023");
            then.status(404);
        })
        .await;

    let sync = sync_clarivate(&client(&server), &options(2023, true)).await.unwrap();

    // 404 is permanent: one call, no retry
    missing.assert_calls_async(1).await;

    assert_eq!(sync.snapshot.len(), 2);
    match sync.snapshot.get("journal a and letters") {
        Some(IndexEntry::Metrics(bag)) => {
            assert_eq!(bag.get("jif"), Some(&MetricValue::Number(3.5)));
            assert_eq!(bag.get("jifQ"), Some(&MetricValue::Text("Q1".to_string())));
        }
        other => panic!("unexpected entry: {:?}", other),
    }
    assert!(sync.snapshot.get("journal b").is_some());

    assert_eq!(sync.errors.len(), 1);
    assert!(sync.errors["C"].starts_with("Not found"));
    assert_eq!(sync.meta.indexed_count, 2);
    assert_eq!(sync.meta.error_count, Some(1));
}

#[tokio::test]
async fn test_reports_without_name_are_skipped() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    for id in ["A", "B", "C"] {
        let path = format!("/journals/{}/reports/year/2023", id);
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(json!({"journal": {"name": "  "}}));
            })
            .await;
    }

    let sync = sync_clarivate(&client(&server), &options(2023, true)).await.unwrap();

    assert!(sync.snapshot.is_empty());
    assert!(sync.errors.is_empty());
    assert_eq!(sync.unnamed, 3);
}

/// Listing with two ids whose reports carry the same journal name; the
/// report for `slow` answers after a delay
async fn run_shared_name_sync(slow: &str) -> f64 {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/journals");
            then.status(200).json_body(json!({
                "metadata": {"total": 2},
                "hits": [{"id": "A"}, {"id": "B"}]
            }));
        })
        .await;
    for (id, jif) in [("A", 1.0), ("B", 2.0)] {
        let delay = if id == slow { 300 } else { 0 };
        let path = format!("/journals/{}/reports/year/2023", id);
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .delay(Duration::from_millis(delay))
                    .json_body(report("Journal X", json!(jif), &["Q2"]));
            })
            .await;
    }

    let sync = sync_clarivate(&client(&server), &options(2023, true)).await.unwrap();
    assert_eq!(sync.snapshot.len(), 1);
    match sync.snapshot.get("journal x") {
        Some(IndexEntry::Metrics(bag)) => match bag.get("jif") {
            Some(MetricValue::Number(jif)) => *jif,
            other => panic!("unexpected jif: {:?}", other),
        },
        other => panic!("unexpected entry: {:?}", other),
    }
}

#[tokio::test]
async fn test_shared_name_keeps_first_listed_report() {
    // A is listed first, so its jif wins however the responses interleave
    assert_eq!(run_shared_name_sync("A").await, 1.0);
    assert_eq!(run_shared_name_sync("B").await, 1.0);
}

#[tokio::test]
async fn test_listing_failure_aborts_after_retries() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path("/journals");
            then.status(500).body("upstream down");
        })
        .await;

    let result = sync_clarivate(&client(&server), &options(2023, true)).await;

    match result {
        Err(BuildError::Listing(FetchError::Server(500, _))) => {}
        other => panic!("expected listing failure, got {:?}", other.map(|s| s.journals.len())),
    }
    listing.assert_calls_async(2).await;
}

#[tokio::test]
async fn test_listing_auth_failure_is_not_retried() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path("/journals");
            then.status(401);
        })
        .await;

    let result = sync_clarivate(&client(&server), &options(2023, false)).await;

    assert!(matches!(result, Err(BuildError::Listing(FetchError::Auth(401)))));
    listing.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_invalid_edition_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({}));
        })
        .await;

    let mut opts = options(2023, false);
    opts.edition = Some("NOPE".to_string());
    let result = sync_clarivate(&client(&server), &opts).await;

    assert!(matches!(result, Err(BuildError::Configuration(_))));
    any.assert_calls_async(0).await;
}
