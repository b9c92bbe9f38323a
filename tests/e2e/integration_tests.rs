//! End-to-end scenarios for the `/verify`, `/health` and `/` endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{TestHarness, UpstreamMode};
use poh_proxy::api::{
    MSG_INTERNAL_ERROR, MSG_INVALID_ADDRESS, MSG_MISSING_ADDRESS, MSG_RATE_LIMITED,
    MSG_UPSTREAM_UNAVAILABLE,
};
use poh_proxy::{ProxyConfig, SERVICE_NAME};
use serde_json::json;
use std::time::Duration;

const HUMAN: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn body(text: &str) -> UpstreamMode {
    UpstreamMode::Body(text.to_string())
}

/// Missing `address` is a 400 and never reaches upstream.
#[tokio::test]
async fn test_missing_address() {
    let harness = TestHarness::setup(body("true")).await;

    let (status, json) = harness.get("/verify").await;
    assert_eq!(status, 400);
    assert_eq!(json, json!({"status": "failed", "message": MSG_MISSING_ADDRESS}));
    assert_eq!(harness.upstream().calls(), 0);

    harness.teardown().await;
}

/// Malformed `address` is a 400 and never reaches upstream.
#[tokio::test]
async fn test_invalid_address() {
    let harness = TestHarness::setup(body("true")).await;

    let (status, json) = harness.verify("not-an-address").await;
    assert_eq!(status, 400);
    assert_eq!(json, json!({"status": "failed", "message": MSG_INVALID_ADDRESS}));
    assert_eq!(harness.upstream().calls(), 0);

    harness.teardown().await;
}

/// A human address is a success, and the repeat is served from cache.
#[tokio::test]
async fn test_human_cached_within_ttl() {
    let harness = TestHarness::setup(body("true")).await;

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "success"}));

    let (status, json) = harness.verify(&HUMAN.to_lowercase()).await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "success"}));

    assert_eq!(harness.upstream().calls(), 1);
    let (path, accept) = harness.upstream().last_request().expect("one request");
    assert_eq!(path, HUMAN);
    assert_eq!(accept.as_deref(), Some("text/plain"));

    harness.teardown().await;
}

/// Upstream `false` (with whitespace) maps to a 200 failed status.
#[tokio::test]
async fn test_not_human() {
    let harness = TestHarness::setup(body(" false\n")).await;

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "failed"}));

    harness.teardown().await;
}

/// Upstream 503 without a throttling hint is an internal error and is not
/// cached; the next request retries upstream.
#[tokio::test]
async fn test_upstream_503_is_internal_error() {
    let harness = TestHarness::setup(UpstreamMode::Status(503, "maintenance".to_string())).await;

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 500);
    assert_eq!(json, json!({"status": "failed", "message": MSG_INTERNAL_ERROR}));

    harness.upstream().set_mode(body("true"));
    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "success"}));
    assert_eq!(harness.upstream().calls(), 2);

    harness.teardown().await;
}

/// Upstream throttling surfaces as 503.
#[tokio::test]
async fn test_upstream_429_is_service_unavailable() {
    let harness = TestHarness::setup(UpstreamMode::Status(429, "slow down".to_string())).await;

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 503);
    assert_eq!(
        json,
        json!({"status": "failed", "message": MSG_UPSTREAM_UNAVAILABLE})
    );

    harness.teardown().await;
}

/// An unexpected 2xx body is an internal error.
#[tokio::test]
async fn test_unexpected_body_is_internal_error() {
    let harness = TestHarness::setup(body("yes")).await;

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 500);
    assert_eq!(json, json!({"status": "failed", "message": MSG_INTERNAL_ERROR}));

    harness.teardown().await;
}

/// Request 100 within the window proceeds; request 101 is rejected.
#[tokio::test]
async fn test_rate_limit_default_window() {
    let harness = TestHarness::setup(body("true")).await;

    for i in 1..=100 {
        let (status, _) = harness.verify(HUMAN).await;
        assert_eq!(status, 200, "request {i} should proceed");
    }

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 429);
    assert_eq!(json, json!({"status": "failed", "message": MSG_RATE_LIMITED}));

    // Only the first request reached upstream
    assert_eq!(harness.upstream().calls(), 1);

    harness.teardown().await;
}

/// Admission resumes once the window has passed.
#[tokio::test]
async fn test_rate_limit_window_elapses() {
    let mut config = ProxyConfig::default();
    config.rate_limit.window_ms = 300;
    config.rate_limit.max_requests = 2;
    let harness = TestHarness::setup_with_config(body("true"), config).await;

    assert_eq!(harness.verify(HUMAN).await.0, 200);
    assert_eq!(harness.verify(HUMAN).await.0, 200);
    assert_eq!(harness.verify(HUMAN).await.0, 429);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(harness.verify(HUMAN).await.0, 200);

    harness.teardown().await;
}

/// Cached results expire after the TTL.
#[tokio::test]
async fn test_cache_expires_after_ttl() {
    let mut config = ProxyConfig::default();
    config.cache.ttl_ms = 200;
    let harness = TestHarness::setup_with_config(body("true"), config).await;

    assert_eq!(harness.verify(HUMAN).await.0, 200);
    assert_eq!(harness.verify(HUMAN).await.0, 200);
    assert_eq!(harness.upstream().calls(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    harness.upstream().set_mode(body("false"));

    let (status, json) = harness.verify(HUMAN).await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "failed"}));
    assert_eq!(harness.upstream().calls(), 2);

    harness.teardown().await;
}

#[tokio::test]
async fn test_health_and_info() {
    let harness = TestHarness::setup(body("true")).await;

    let (status, json) = harness.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"status": "ok", "service": SERVICE_NAME}));

    let (status, json) = harness.get("/").await;
    assert_eq!(status, 200);
    assert_eq!(json["endpoints"]["verify"], "/verify?address=0x...");
    assert_eq!(json["cache"]["ttl_ms"], 300_000);
    assert_eq!(json["rate_limit"]["max_requests"], 100);

    harness.teardown().await;
}
