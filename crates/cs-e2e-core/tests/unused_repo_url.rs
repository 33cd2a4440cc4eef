//! Unused fixture URL picker against a mock service.

use cs_e2e_core::api::{ApiClient, API_PATH};
use cs_e2e_core::fixtures::{centirepo_url, UnusedRepoUrls};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(count: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": [], "meta": { "count": count }, "links": {}
    }))
}

#[tokio::test]
async fn test_picks_free_urls_in_worker_range_without_repeats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/repositories/", API_PATH)))
        .and(query_param("origin", "external"))
        .respond_with(page(0))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    // 50 workers: worker 10 owns fixtures 21 and 22
    let mut picker = UnusedRepoUrls::new(client, 50, 10);
    assert_eq!(picker.range(), &(21..=22));

    let mut picked = Vec::new();
    while picked.len() < 2 {
        if let Ok(url) = picker.next().await {
            assert!(!picked.contains(&url));
            picked.push(url);
        }
    }
    picked.sort();
    assert_eq!(picked, vec![centirepo_url(21), centirepo_url(22)]);
}

#[tokio::test]
async fn test_all_taken_reports_worker_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/repositories/", API_PATH)))
        .respond_with(page(1))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut picker = UnusedRepoUrls::new(client, 50, 0);
    let err = picker.next().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Worker 0 could not find a free repo in its range 1-2"
    );
}

#[tokio::test]
async fn test_lookup_failure_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let mut picker = UnusedRepoUrls::new(client, 1, 0);
    let err = picker.next().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to verify URL availability");
}

#[tokio::test]
async fn test_response_without_count_is_not_free() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/repositories/", API_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    // 50 workers: worker 0 owns fixtures 1 and 2, so two lookups
    let mut picker = UnusedRepoUrls::new(client, 50, 0);
    let err = picker.next().await.unwrap_err();
    assert!(err.to_string().contains("could not find a free repo"));
}
