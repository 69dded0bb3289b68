//! Organization lookup client tests against a mock GraphQL server

use serde_json::json;
use sipin_core::{OrganizationLookup, SipError};
use sipin_worker::config::OrgApiSettings;
use sipin_worker::org_api::{label_query, OrgApiClient};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The blocking client is built, used and dropped on a blocking thread
async fn lookup(url: String, timeout_secs: u64, flow_id: &'static str) -> sipin_core::Result<String> {
    tokio::task::spawn_blocking(move || {
        let client = OrgApiClient::new(&OrgApiSettings { url, timeout_secs }).unwrap();
        client.label_for(flow_id)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_label_is_read_from_first_organization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "query": label_query("OR-abc123") })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "organizations": [ { "label": "Het Archief" } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let label = lookup(format!("{}/graphql", server.uri()), 5, "OR-abc123")
        .await
        .unwrap();
    assert_eq!(label, "Het Archief");
}

#[tokio::test]
async fn test_unknown_organization_names_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "organizations": [] } })),
        )
        .mount(&server)
        .await;

    let err = lookup(server.uri(), 5, "OR-missing").await.unwrap_err();
    assert!(matches!(err, SipError::LookupUnavailable(ref m) if m.contains("OR-missing")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = lookup(server.uri(), 5, "OR-abc123").await.unwrap_err();
    assert!(matches!(err, SipError::LookupUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "organizations": [ { "label": "late" } ] } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = lookup(server.uri(), 1, "OR-abc123").await.unwrap_err();
    assert!(matches!(err, SipError::LookupUnavailable(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_retryable() {
    let server = MockServer::start().await;
    let url = server.uri();
    drop(server);

    let err = lookup(url, 2, "OR-abc123").await.unwrap_err();
    assert!(err.is_retryable());
}
