//! HTTP surface of the proxy.
//!
//! | Route                    | Purpose                               |
//! |--------------------------|---------------------------------------|
//! | `GET /verify?address=…`  | Layer3 PoH check                      |
//! | `GET /health`            | Liveness probe                        |
//! | `GET /`                  | Service metadata and active settings  |

mod handlers;
mod response;

pub use handlers::{client_id, verify_request};
pub use response::{
    VerifyBody, VerifyReply, MSG_INTERNAL_ERROR, MSG_INVALID_ADDRESS, MSG_MISSING_ADDRESS,
    MSG_RATE_LIMITED, MSG_UPSTREAM_UNAVAILABLE,
};

use crate::config::ProxyConfig;
use crate::error::Result;
use crate::rate_limit::RateLimiter;
use crate::verify::{LineaPohClient, PohVerifier, ResultCache, UpstreamClient};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by all request handlers.
///
/// Owns the result cache and the rate-limit table for the lifetime of the
/// server. Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct AppState {
    /// Cache-fronted PoH verifier.
    pub verifier: PohVerifier,
    /// Per-client rate limiter.
    pub limiter: RateLimiter,
    /// Active configuration.
    pub config: Arc<ProxyConfig>,
    /// When the state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state from configuration with a custom upstream client.
    #[must_use]
    pub fn new(config: ProxyConfig, upstream: Arc<dyn UpstreamClient>) -> Self {
        let cache = ResultCache::with_capacity(config.cache.ttl(), config.cache.capacity);
        let limiter = RateLimiter::new(config.rate_limit.window(), config.rate_limit.max_requests);

        Self {
            verifier: PohVerifier::new(cache, upstream),
            limiter,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }

    /// Build state talking to the configured Linea PoH API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: ProxyConfig) -> Result<Self> {
        let upstream = Arc::new(LineaPohClient::new(&config.upstream)?);
        Ok(Self::new(config, upstream))
    }
}

/// Build the axum router for the proxy.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health))
        .route("/verify", get(handlers::verify))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
