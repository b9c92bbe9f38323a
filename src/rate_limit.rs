//! Per-client sliding-window rate limiting.
//!
//! Each client keeps the instants of its admitted requests. Before every
//! decision, instants that fell out of the window are dropped; the request is
//! admitted while fewer than `max_requests` remain. Rejected requests are not
//! recorded, so a client hammering the endpoint is readmitted as soon as its
//! oldest admitted request leaves the window.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default window length (1 minute).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default requests per client per window.
pub const DEFAULT_MAX_REQUESTS: usize = 100;

/// Sliding-window rate limiter keyed by client identifier.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per client per `window`.
    #[must_use]
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    /// Window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Requests admitted per client per window.
    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Decide whether `client_id` may make a request now.
    pub fn admit(&self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now())
    }

    /// Decide whether `client_id` may make a request at `now`.
    ///
    /// Admission records `now`; rejection leaves the window untouched.
    pub fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        let timestamps = windows.entry(client_id.to_string()).or_default();

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            debug!(
                client = %client_id,
                in_window = timestamps.len(),
                "rate limit reached"
            );
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Requests currently counted against `client_id` as of `now`.
    #[must_use]
    pub fn in_window_at(&self, client_id: &str, now: Instant) -> usize {
        self.windows.lock().get(client_id).map_or(0, |timestamps| {
            timestamps
                .iter()
                .filter(|&&ts| now.saturating_duration_since(ts) < self.window)
                .count()
        })
    }

    /// Forget clients with no request inside the window. Returns the number
    /// of clients dropped.
    pub fn prune_idle(&self) -> usize {
        self.prune_idle_at(Instant::now())
    }

    /// Forget clients with no request inside the window as of `now`.
    pub fn prune_idle_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < self.window)
        });
        before - windows.len()
    }

    /// Get number of tracked clients.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_REQUESTS)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}
