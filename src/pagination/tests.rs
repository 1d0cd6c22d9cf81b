//! Tests for the pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, QueryParams, RecordingSleeper, RetryPolicy};
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn records(range: std::ops::Range<u32>) -> Value {
    Value::Array(range.map(|i| json!({ "id": i })).collect())
}

fn client_for(server: &MockServer, sleeper: &RecordingSleeper) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .api_key("k")
        .build();
    Arc::new(HttpClient::with_sleeper(config, Arc::new(sleeper.clone())).unwrap())
}

async fn mount_page(server: &MockServer, resource: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/1.6/{resource}/")))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// LastPageRule Tests
// ============================================================================

#[test_case(LastPageRule::ShortPage, 25, false)]
#[test_case(LastPageRule::ShortPage, 24, true)]
#[test_case(LastPageRule::ShortPage, 0, true)]
#[test_case(LastPageRule::AtMostOne, 2, false)]
#[test_case(LastPageRule::AtMostOne, 1, true)]
#[test_case(LastPageRule::AtMostOne, 0, true)]
fn test_last_page_rule(rule: LastPageRule, count: usize, expected: bool) {
    assert_eq!(rule.is_last(count, 25), expected);
}

#[test]
fn test_last_page_rule_serde() {
    let rule: LastPageRule = serde_json::from_str("\"at_most_one\"").unwrap();
    assert_eq!(rule, LastPageRule::AtMostOne);
    assert_eq!(LastPageRule::default(), LastPageRule::ShortPage);
}

// ============================================================================
// PageReader Tests
// ============================================================================

#[tokio::test]
async fn test_reader_walks_until_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "affiliates", 1, records(0..25)).await;
    mount_page(&server, "affiliates", 2, records(25..35)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(3));

    let first = reader.next_page().await.unwrap().unwrap();
    assert_eq!(first.number, 1);
    assert_eq!(first.len(), 25);
    assert!(!first.is_last);
    assert_eq!(reader.current_page(), 2);

    let second = reader.next_page().await.unwrap().unwrap();
    assert_eq!(second.number, 2);
    assert_eq!(second.len(), 10);
    assert!(second.is_last);
    assert!(reader.is_done());

    assert!(reader.next_page().await.unwrap().is_none());
    assert_eq!(reader.pages_fetched(), 2);
    assert_eq!(reader.records_fetched(), 35);
}

#[tokio::test]
async fn test_records_stream_tags_page_numbers() {
    let server = MockServer::start().await;
    mount_page(&server, "commissions", 4, records(0..25)).await;
    mount_page(&server, "commissions", 5, records(25..27)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "commissions", QueryParams::new(), 4, RetryPolicy::new(3));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 27);
    assert!(pairs[..25].iter().all(|(page, _)| *page == 4));
    assert!(pairs[25..].iter().all(|(page, _)| *page == 5));
    assert_eq!(pairs[26].1, json!({"id": 26}));

    // Page numbers never decrease and step by one
    let pages: Vec<u32> = pairs.iter().map(|(p, _)| *p).collect();
    assert!(pages.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1));
}

#[tokio::test]
async fn test_reader_passes_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.6/conversions/"))
        .and(query_param("date_from", "2024-03-01"))
        .and(query_param("date_to", "2024-03-01"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records(0..3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = QueryParams::new();
    params.insert("date_from".to_string(), "2024-03-01".to_string());
    params.insert("date_to".to_string(), "2024-03-01".to_string());

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "conversions", params, 1, RetryPolicy::new(3));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 3);
}

#[tokio::test]
async fn test_reader_empty_collection() {
    let server = MockServer::start().await;
    mount_page(&server, "programs", 1, json!([])).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "programs", QueryParams::new(), 1, RetryPolicy::new(3));

    let page = reader.next_page().await.unwrap().unwrap();
    assert!(page.is_empty());
    assert!(page.is_last);
    assert!(reader.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_reader_singleton_object_is_last_page() {
    let server = MockServer::start().await;
    mount_page(&server, "programs", 1, json!({"id": "p1"})).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "programs", QueryParams::new(), 1, RetryPolicy::new(3));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs, vec![(1, json!({"id": "p1"}))]);
}

#[tokio::test]
async fn test_reader_at_most_one_rule() {
    let server = MockServer::start().await;
    mount_page(&server, "customers", 1, records(0..2)).await;
    mount_page(&server, "customers", 2, records(2..3)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "customers", QueryParams::new(), 1, RetryPolicy::new(3))
        .with_last_page(LastPageRule::AtMostOne);

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 3);
    assert_eq!(reader.pages_fetched(), 2);
}

#[tokio::test]
async fn test_reader_custom_page_size() {
    let server = MockServer::start().await;
    mount_page(&server, "affiliates", 1, records(0..2)).await;
    mount_page(&server, "affiliates", 2, records(2..3)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(3))
        .with_page_size(2);

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 3);
}

#[tokio::test]
async fn test_reader_retries_same_page_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "affiliates", 1, records(0..3)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(2));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 3);
    assert_eq!(reader.retries(), 2);
    assert_eq!(sleeper.slept(), vec![Duration::from_secs(60); 2]);
}

#[tokio::test]
async fn test_reader_retries_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "affiliates", 1, records(0..1)).await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(1));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(sleeper.count(), 1);
}

fn slow_client_for(server: &MockServer, sleeper: &RecordingSleeper) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .api_key("k")
        .timeout(Duration::from_millis(200))
        .build();
    Arc::new(HttpClient::with_sleeper(config, Arc::new(sleeper.clone())).unwrap())
}

#[tokio::test]
async fn test_reader_retries_timed_out_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(records(0..3))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "affiliates", 1, records(0..3)).await;

    let sleeper = RecordingSleeper::new();
    let client = slow_client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(2));

    let pairs: Vec<(u32, Value)> = reader.records().try_collect().await.unwrap();
    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|(page, _)| *page == 1));
    assert_eq!(reader.retries(), 2);
    assert_eq!(sleeper.slept(), vec![Duration::from_secs(60); 2]);
}

#[tokio::test]
async fn test_reader_timeouts_exhaust_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(records(0..3))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = slow_client_for(&server, &sleeper);
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 1, RetryPolicy::new(1));

    let err = reader.next_page().await.unwrap_err();
    match &err {
        Error::RetriesExhausted { retries, last, .. } => {
            assert_eq!(*retries, 1);
            assert!(matches!(**last, Error::Http(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sleeper.slept(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn test_reader_fails_after_exhausting_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(4)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = client_for(&server, &sleeper);
    let policy = RetryPolicy::new(3).with_delay(Duration::from_secs(5));
    let mut reader = PageReader::new(client, "affiliates", QueryParams::new(), 7, policy);

    let err = reader.next_page().await.unwrap_err();
    match err {
        Error::RetriesExhausted { url, retries, last } => {
            assert!(url.ends_with("/1.6/affiliates/?page=7"));
            assert_eq!(retries, 3);
            assert!(last.to_string().contains("bad gateway"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sleeper.slept(), vec![Duration::from_secs(5); 3]);
    assert_eq!(reader.current_page(), 7);
}
