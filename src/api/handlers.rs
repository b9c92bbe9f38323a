//! Request handlers.

use crate::address::is_valid_address;
use crate::api::response::VerifyReply;
use crate::api::AppState;
use crate::SERVICE_NAME;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Service description reported by `/`.
const DESCRIPTION: &str = "REST API proxy for Linea Proof of Humanity verification, \
                           compatible with Layer3 Custom API Integration";

/// Identifier used when no peer address is known.
const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit identity of a request.
///
/// The peer IP is used unless `trust_forwarded_for` is set, in which case the
/// first `X-Forwarded-For` hop (then `X-Real-IP`) takes precedence.
#[must_use]
pub fn client_id(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

/// Run one `/verify` request through admission, validation, cache and
/// upstream, in that order.
pub async fn verify_request(
    state: &AppState,
    client: &str,
    address: Option<&str>,
) -> VerifyReply {
    if !state.limiter.admit(client) {
        warn!(client = %client, "Rate limit exceeded");
        return VerifyReply::RateLimited;
    }

    let address = match address {
        Some(a) if !a.is_empty() => a,
        _ => {
            debug!(client = %client, address = ?address, "Missing required parameter: address");
            return VerifyReply::MissingAddress;
        }
    };

    if !is_valid_address(address) {
        debug!(client = %client, address = %address, "Invalid Ethereum address format");
        return VerifyReply::InvalidAddress;
    }

    match state.verifier.check(address).await {
        Ok(status) => VerifyReply::Verified(status),
        Err(e) => VerifyReply::from_upstream_error(&e),
    }
}

/// `GET /verify?address=0x...`
pub(crate) async fn verify(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> VerifyReply {
    let client = client_id(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.rate_limit.trust_forwarded_for,
    );
    verify_request(&state, &client, params.get("address").map(String::as_str)).await
}

/// `GET /health`
pub(crate) async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": SERVICE_NAME,
        })),
    )
}

/// `GET /`
pub(crate) async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    let stats = state.verifier.cache_stats();
    (
        StatusCode::OK,
        Json(json!({
            "service": format!("{SERVICE_NAME} for Layer3"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": DESCRIPTION,
            "endpoints": {
                "verify": "/verify?address=0x...",
                "health": "/health",
            },
            "cache": {
                "ttl_ms": config.cache.ttl_ms,
                "capacity": config.cache.capacity,
                "entries": state.verifier.cache().len(),
                "stats": stats,
                "hit_rate": stats.hit_rate(),
            },
            "rate_limit": {
                "window_ms": config.rate_limit.window_ms,
                "max_requests": config.rate_limit.max_requests,
            },
            "started_at": state.started_at.to_rfc3339(),
        })),
    )
}
