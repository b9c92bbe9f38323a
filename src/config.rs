//! Configuration for poh-proxy.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default Linea Proof of Humanity API base URL.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://poh-api.linea.build/poh/v2";

/// Proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Result cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-client rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Upstream PoH API configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Listening port (0 for auto-select).
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long shutdown waits for in-flight requests before giving up on
    /// them, in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached verification result, in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,

    /// Maximum number of cached addresses before LRU eviction.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

/// Sliding-window rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests admitted per client within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Identify clients by `X-Forwarded-For` / `X-Real-IP` instead of the
    /// peer address. Only enable behind a trusted reverse proxy.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Upstream PoH API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL; the address is appended as the last path segment.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds. `None` (the default) leaves upstream
    /// calls unbounded apart from whatever the transport enforces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            upstream: UpstreamConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            timeout_ms: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    3000
}

const fn default_shutdown_grace_ms() -> u64 {
    10_000
}

const fn default_cache_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

const fn default_cache_capacity() -> usize {
    100_000
}

const fn default_window_ms() -> u64 {
    60_000 // 1 minute
}

const fn default_max_requests() -> usize {
    100
}

fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

impl ServerConfig {
    /// Socket address to bind.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Shutdown drain limit as a [`Duration`].
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl CacheConfig {
    /// Cache TTL as a [`Duration`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl RateLimitConfig {
    /// Window length as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl UpstreamConfig {
    /// Request timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ProxyConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that the configuration can drive a working proxy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> crate::Result<()> {
        if self.cache.ttl_ms == 0 {
            return Err(crate::Error::Config("cache.ttl_ms must be > 0".into()));
        }
        if self.cache.capacity == 0 {
            return Err(crate::Error::Config("cache.capacity must be > 0".into()));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(crate::Error::Config("rate_limit.window_ms must be > 0".into()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(crate::Error::Config(
                "rate_limit.max_requests must be > 0".into(),
            ));
        }
        if self.upstream.timeout_ms == Some(0) {
            return Err(crate::Error::Config("upstream.timeout_ms must be > 0".into()));
        }
        let base = self.upstream.base_url.trim();
        if reqwest::Url::parse(base).is_err() {
            return Err(crate::Error::Config(format!(
                "upstream.base_url is not a valid URL: {base:?}"
            )));
        }
        Ok(())
    }
}
