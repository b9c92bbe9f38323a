//! Proof of Humanity verification for poh-proxy.
//!
//! # Architecture
//!
//! ```text
//! validated address
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Check result cache  │
//! └─────────┬───────────┘
//!           │
//!    ┌──────┴──────┐
//!    │             │
//!   HIT          MISS
//!    │             │
//!    ▼             ▼
//! Answer       Query Linea PoH API
//!                  │
//!           ┌──────┴──────┐
//!           │             │
//!        true/false     error
//!           │             │
//!           ▼             ▼
//!     Cache + answer   Report (not cached)
//! ```

mod cache;
mod upstream;
mod verifier;

pub use cache::{CacheStats, ResultCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use upstream::{LineaPohClient, UpstreamClient};
pub use verifier::PohVerifier;

#[cfg(test)]
pub(crate) use verifier::tests::ScriptedUpstream;

use thiserror::Error;

/// Proof of Humanity status of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PohStatus {
    /// The address belongs to a verified human.
    Human,
    /// The address is not verified.
    NotHuman,
}

/// Failure while asking the upstream PoH API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The API answered with a non-success HTTP status.
    #[error("Linea PoH API returned status {code}")]
    Status {
        /// HTTP status code.
        code: u16,
    },

    /// The API answered 2xx with a body other than `true` or `false`.
    #[error("Unexpected response from Linea PoH API: {raw}")]
    Format {
        /// Trimmed response body.
        raw: String,
    },

    /// The request never produced a usable response.
    #[error("Failed to call Linea PoH API: {message}")]
    Transport {
        /// Transport error description.
        message: String,
    },
}

impl UpstreamError {
    /// Whether the upstream is throttling us.
    ///
    /// HTTP 429 counts, as does any error whose text mentions rate limiting.
    /// The text match is a heuristic: the PoH API documents no throttling
    /// signal of its own.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        if matches!(self, Self::Status { code: 429 }) {
            return true;
        }
        let text = self.to_string().to_ascii_lowercase();
        text.contains("rate limit") || text.contains("too many requests")
    }
}

/// Outcome of one verification: a status, or why none could be obtained.
pub type VerificationResult = std::result::Result<PohStatus, UpstreamError>;
