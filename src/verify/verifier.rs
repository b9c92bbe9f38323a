//! PoH verifier combining the result cache and the upstream client.

use crate::verify::cache::{CacheStats, ResultCache};
use crate::verify::upstream::UpstreamClient;
use crate::verify::VerificationResult;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answers PoH queries, consulting the cache before the upstream API.
///
/// Cloning is cheap; clones share the same cache and client.
#[derive(Clone)]
pub struct PohVerifier {
    cache: ResultCache,
    upstream: Arc<dyn UpstreamClient>,
}

impl PohVerifier {
    /// Create a verifier over an existing cache and upstream client.
    #[must_use]
    pub fn new(cache: ResultCache, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { cache, upstream }
    }

    /// Resolve the PoH status of an already validated `address`.
    ///
    /// 1. Check the result cache (fast path)
    /// 2. Query the upstream API
    /// 3. Cache successful answers
    ///
    /// Upstream failures are returned as-is and never cached. No lock is
    /// held while the upstream call is in flight, so two concurrent misses
    /// for one address may both reach upstream; the later write wins.
    pub async fn check(&self, address: &str) -> VerificationResult {
        if let Some(status) = self.cache.get(address) {
            debug!("PoH status for {address} served from cache: {status:?}");
            return Ok(status);
        }

        match self.upstream.verify(address).await {
            Ok(status) => {
                self.cache.put(address, status);
                info!("PoH status for {address}: {status:?}");
                Ok(status)
            }
            Err(e) => {
                warn!("Error verifying PoH for {address}: {e}");
                Err(e)
            }
        }
    }

    /// Shared result cache.
    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Get cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
