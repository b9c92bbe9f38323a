//! Command-line interface definition.

use clap::Parser;
use poh_proxy::ProxyConfig;
use std::net::IpAddr;
use std::path::PathBuf;

/// Linea Proof of Humanity verification proxy for Layer3.
#[derive(Parser, Debug)]
#[command(name = "poh-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST")]
    pub host: Option<IpAddr>,

    /// Listening port [default: 3000].
    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Shutdown drain limit in milliseconds [default: 10000].
    #[arg(long, env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: Option<u64>,

    /// Cache TTL in milliseconds [default: 300000].
    #[arg(long, env = "CACHE_TTL_MS")]
    pub cache_ttl_ms: Option<u64>,

    /// Maximum cached addresses [default: 100000].
    #[arg(long, env = "CACHE_CAPACITY")]
    pub cache_capacity: Option<usize>,

    /// Rate-limit window in milliseconds [default: 60000].
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS")]
    pub rate_limit_window_ms: Option<u64>,

    /// Requests per client per window [default: 100].
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS")]
    pub rate_limit_max_requests: Option<usize>,

    /// Identify clients by X-Forwarded-For / X-Real-IP.
    #[arg(long, env = "TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Linea PoH API base URL.
    #[arg(long, env = "POH_API_BASE_URL")]
    pub upstream_url: Option<String>,

    /// Upstream request timeout in milliseconds (unbounded if unset).
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: Option<u64>,

    /// Log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Convert CLI arguments into a `ProxyConfig`.
    ///
    /// Values given on the command line or through the environment override
    /// the configuration file, which overrides built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<ProxyConfig> {
        let mut config = if let Some(ref path) = self.config {
            ProxyConfig::from_file(path)?
        } else {
            ProxyConfig::default()
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(grace) = self.shutdown_grace_ms {
            config.server.shutdown_grace_ms = grace;
        }

        if let Some(ttl_ms) = self.cache_ttl_ms {
            config.cache.ttl_ms = ttl_ms;
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache.capacity = capacity;
        }

        if let Some(window_ms) = self.rate_limit_window_ms {
            config.rate_limit.window_ms = window_ms;
        }
        if let Some(max_requests) = self.rate_limit_max_requests {
            config.rate_limit.max_requests = max_requests;
        }
        if self.trust_forwarded_for {
            config.rate_limit.trust_forwarded_for = true;
        }

        if let Some(url) = self.upstream_url {
            config.upstream.base_url = url;
        }
        if self.upstream_timeout_ms.is_some() {
            config.upstream.timeout_ms = self.upstream_timeout_ms;
        }

        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config)
    }
}
