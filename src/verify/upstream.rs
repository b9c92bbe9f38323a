//! Linea PoH API client.
//!
//! Issues a single `GET <base>/<address>` per verification and maps the
//! plain-text answer (`true` / `false`) into a [`VerificationResult`].

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::verify::{PohStatus, UpstreamError, VerificationResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

/// Source of Proof of Humanity answers.
///
/// Implementations report every failure as an [`UpstreamError`] value and
/// make exactly one attempt per call.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Query the PoH status of an already validated `address`.
    async fn verify(&self, address: &str) -> VerificationResult;
}

/// HTTP client for the Linea PoH API.
///
/// Without `upstream.timeout_ms` a call waits as long as the transport
/// allows; configure a timeout to bound slow upstream responses.
#[derive(Debug, Clone)]
pub struct LineaPohClient {
    http: reqwest::Client,
    base_url: String,
}

impl LineaPohClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("poh-proxy/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, address: &str) -> String {
        format!("{}/{address}", self.base_url)
    }
}

/// Map a successful response body to a PoH status.
pub(crate) fn parse_body(body: &str) -> VerificationResult {
    match body.trim() {
        "true" => Ok(PohStatus::Human),
        "false" => Ok(PohStatus::NotHuman),
        other => Err(UpstreamError::Format {
            raw: other.to_string(),
        }),
    }
}

#[async_trait]
impl UpstreamClient for LineaPohClient {
    async fn verify(&self, address: &str) -> VerificationResult {
        let url = self.url_for(address);
        debug!("Querying PoH API: {url}");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| {
                warn!("PoH API request for {address} failed: {e}");
                UpstreamError::Transport {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("PoH API returned status {} for {address}", status.as_u16());
            return Err(UpstreamError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| UpstreamError::Transport {
            message: e.to_string(),
        })?;

        parse_body(&body)
    }
}
