//! # poh-proxy
//!
//! A small HTTP proxy that answers Layer3 Custom API Integration requests by
//! checking an Ethereum address against the Linea Proof of Humanity API.
//!
//! ```text
//! GET /verify?address=0x...
//!        │
//!        ▼
//!   rate limiter ──reject──► 429
//!        │
//!        ▼
//!   address check ──bad──► 400
//!        │
//!        ▼
//!   result cache ──hit──► 200 success / failed
//!        │ miss
//!        ▼
//!   Linea PoH API ──error──► 500 / 503
//!        │
//!        ▼
//!   cache + 200 success / failed
//! ```
//!
//! The cache and rate-limit tables live in memory for the lifetime of the
//! process and are shared between request tasks through [`api::AppState`].

pub mod address;
pub mod api;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod server;
pub mod verify;

pub use address::{is_valid_address, normalize_address};
pub use api::{build_router, AppState};
pub use config::ProxyConfig;
pub use error::{Error, Result};
pub use rate_limit::RateLimiter;
pub use server::{ProxyBuilder, RunningProxy};
pub use verify::{
    LineaPohClient, PohStatus, PohVerifier, ResultCache, UpstreamClient, UpstreamError,
};

/// Human-readable service name reported by `/health` and `/`.
pub const SERVICE_NAME: &str = "Linea PoH API Proxy";
