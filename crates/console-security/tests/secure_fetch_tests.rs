//! SecureClient Tests
//!
//! Exercises the secured request wrapper against the in-process mock API.
//!
use console_security::prelude::*;
use console_security::{EndReason, FetchOptions};
use console_test_utils::{closed_port_url, MockApi};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::TryRecvError;

fn demo_client() -> (Arc<SessionStore>, SecureClient) {
    let session = Arc::new(SessionStore::demo());
    let client = SecureClient::new(Arc::clone(&session));
    (session, client)
}

#[derive(Debug, Deserialize, PartialEq)]
struct OkBody {
    ok: bool,
}

#[tokio::test]
async fn test_ok_body_is_parsed() {
    let api = MockApi::start().await;
    let (session, client) = demo_client();
    let mut events = session.subscribe();

    let value = client
        .fetch_json(&api.url("/ok"), FetchOptions::get())
        .await
        .unwrap();

    assert_eq!(value, json!({ "ok": true }));
    assert!(session.is_authenticated());
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_ok_body_typed() {
    let api = MockApi::start().await;
    let (_session, client) = demo_client();

    let body: OkBody = client.fetch(&api.url("/ok"), FetchOptions::get()).await.unwrap();

    assert_eq!(body, OkBody { ok: true });
}

#[tokio::test]
async fn test_unauthorized_forces_single_logout() {
    let api = MockApi::start().await;
    let (session, client) = demo_client();
    let mut events = session.subscribe();

    let err = client
        .fetch_json(&api.url("/unauthorized"), FetchOptions::get())
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::Ended {
            reason: EndReason::Unauthorized,
            ..
        })
    ));
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_repeated_unauthorized_is_idempotent() {
    let api = MockApi::start().await;
    let (session, client) = demo_client();
    let mut events = session.subscribe();

    for _ in 0..2 {
        let err = client
            .fetch_json(&api.url("/unauthorized"), FetchOptions::get())
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
    }

    assert!(events.try_recv().is_ok());
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_other_status_is_api_error() {
    let api = MockApi::start().await;
    let (session, client) = demo_client();

    let err = client
        .fetch_json(&api.url("/forbidden"), FetchOptions::get())
        .await
        .unwrap_err();

    match err {
        FetchError::Api {
            status,
            status_text,
        } => {
            assert_eq!(status, 403);
            assert_eq!(status_text, "Forbidden");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_missing_route_is_api_error() {
    let api = MockApi::start().await;
    let (_session, client) = demo_client();

    let err = client
        .fetch_json(&api.url("/nowhere"), FetchOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_hanging_endpoint_times_out() {
    let api = MockApi::start().await;
    let (session, client) = demo_client();

    let started = Instant::now();
    let err = client
        .fetch_json(&api.url("/hang"), FetchOptions::get().with_timeout_ms(50))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(matches!(err, FetchError::Timeout { timeout_ms: 50 }));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_security_headers_sent() {
    let api = MockApi::start().await;
    let (_session, client) = demo_client();

    let options = FetchOptions::get()
        .with_raw_header("Cache-Control", "max-age=600")
        .unwrap()
        .with_raw_header("X-Frame-Options", "SAMEORIGIN")
        .unwrap()
        .with_raw_header("X-Trace", "trace-42")
        .unwrap();
    let echoed = client.fetch_json(&api.url("/headers"), options).await.unwrap();

    assert_eq!(
        echoed["authorization"],
        "Bearer mk_proto_secure_jwt_token_enterprise"
    );
    assert_eq!(echoed["cache-control"], "no-store, no-cache, must-revalidate");
    assert_eq!(echoed["x-content-type-options"], "nosniff");
    assert_eq!(echoed["x-frame-options"], "DENY");
    assert_eq!(echoed["x-trace"], "trace-42");
}

#[tokio::test]
async fn test_logged_out_client_sends_no_token() {
    let api = MockApi::start().await;
    let session = Arc::new(SessionStore::new());
    let client = SecureClient::new(Arc::clone(&session));

    let echoed = client
        .fetch_json(&api.url("/headers"), FetchOptions::get())
        .await
        .unwrap();

    assert!(echoed.get("authorization").is_none());
    assert_eq!(echoed["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let api = MockApi::start().await;
    let (_session, client) = demo_client();

    let err = client
        .fetch_json(&api.url("/not-json"), FetchOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "decode");
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let (session, client) = demo_client();

    let err = client
        .fetch_json(&closed_port_url(), FetchOptions::get().with_timeout_ms(2000))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "transport");
    assert!(err.is_retryable());
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_single_attempt_per_call() {
    let api = MockApi::start().await;
    let (_session, client) = demo_client();

    let _ = client
        .fetch_json(&api.url("/forbidden"), FetchOptions::get())
        .await;

    assert_eq!(api.hits(), 1);
}
