//! Credential cache against a mock authorization endpoint

use chatrelay::credentials::{
    Clock, CredentialCache, CredentialFetchError, OAuthTokenFetcher, TokenFetcher,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_KEY: &str = "Basic dGVzdDpzZWNyZXQ=";
const SCOPE: &str = "GIGACHAT_API_PERS";

fn fetcher_for(server: &MockServer) -> OAuthTokenFetcher {
    OAuthTokenFetcher::new(
        format!("{}/api/v2/oauth", server.uri()),
        AUTH_KEY,
        SCOPE,
        Some(5),
    )
    .unwrap()
}

/// Test clock; clones share one instant.
#[derive(Clone)]
struct SteppedClock(Arc<Mutex<DateTime<Utc>>>);

impl SteppedClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Utc::now())))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for SteppedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn token_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "expires_in": expires_in,
    }))
}

#[tokio::test]
async fn test_fetch_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .and(header("Authorization", AUTH_KEY))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(header_exists("RqUID"))
        .and(body_string(format!("scope={}", SCOPE)))
        .respond_with(token_response("T1", 1800))
        .expect(1)
        .mount(&server)
        .await;

    let grant = fetcher_for(&server).fetch_token().await.unwrap();
    assert_eq!(grant.access_token, "T1");
    assert_eq!(grant.expires_in, 1800);
}

#[tokio::test]
async fn test_rquid_is_fresh_per_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(token_response("T1", 1800))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    fetcher.fetch_token().await.unwrap();
    fetcher.fetch_token().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let ids: Vec<String> = requests
        .iter()
        .map(|r| r.headers.get("RqUID").unwrap().to_str().unwrap().to_string())
        .collect();

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(ids.iter().all(|id| id.len() == 36));
}

#[tokio::test]
async fn test_cached_token_until_margin_then_one_refetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(token_response("T1", 1800))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(token_response("T2", 1800))
        .expect(1)
        .mount(&server)
        .await;

    let clock = SteppedClock::new();
    let cache = CredentialCache::with_clock(Arc::new(fetcher_for(&server)), Arc::new(clock.clone()));

    assert_eq!(cache.get_valid_token().await.unwrap(), "T1");

    clock.advance(Duration::seconds(1000));
    assert_eq!(cache.get_valid_token().await.unwrap(), "T1");

    clock.advance(Duration::seconds(741));
    assert_eq!(cache.get_valid_token().await.unwrap(), "T2");
    assert_eq!(cache.get_valid_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let cache = CredentialCache::new(Arc::new(fetcher_for(&server)));
    let err = cache.get_valid_token().await.unwrap_err();

    match err {
        CredentialFetchError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(cache.expires_at().await.is_none());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "x" })))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch_token().await.unwrap_err();
    assert!(matches!(err, CredentialFetchError::InvalidResponse(_)));
}

async fn assert_rejected_grant(body: serde_json::Value) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let cache = CredentialCache::new(Arc::new(fetcher_for(&server)));
    let err = cache.get_valid_token().await.unwrap_err();

    assert!(
        matches!(err, CredentialFetchError::InvalidResponse(_)),
        "unexpected error: {:?}",
        err
    );
    assert!(cache.expires_at().await.is_none());
}

#[tokio::test]
async fn test_non_integer_lifetime_is_invalid_response() {
    assert_rejected_grant(json!({ "access_token": "T1", "expires_in": "soon" })).await;
}

#[tokio::test]
async fn test_empty_access_token_is_invalid_response() {
    assert_rejected_grant(json!({ "access_token": "", "expires_in": 1800 })).await;
}

#[tokio::test]
async fn test_negative_lifetime_is_invalid_response() {
    assert_rejected_grant(json!({ "access_token": "T1", "expires_in": -5 })).await;
}

#[tokio::test]
async fn test_out_of_range_lifetime_is_invalid_response() {
    assert_rejected_grant(json!({ "access_token": "T1", "expires_in": 10_000_000_000_000i64 })).await;
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server);
    drop(server);

    let err = fetcher.fetch_token().await.unwrap_err();
    assert!(matches!(err, CredentialFetchError::Network(_)));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_remote_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/oauth"))
        .respond_with(token_response("T1", 1800).set_delay(std::time::Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(CredentialCache::new(Arc::new(fetcher_for(&server))));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_valid_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "T1");
    }
}
