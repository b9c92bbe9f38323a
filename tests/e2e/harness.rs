//! Test harness wiring a fake PoH API to a running proxy.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::fake_upstream::{FakePohApi, UpstreamMode};
use poh_proxy::{ProxyBuilder, ProxyConfig};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A proxy under test plus its fake upstream.
pub struct TestHarness {
    upstream: FakePohApi,
    proxy_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<poh_proxy::Result<()>>,
    http: reqwest::Client,
}

impl TestHarness {
    /// Start with default proxy settings and the given upstream behaviour.
    pub async fn setup(mode: UpstreamMode) -> Self {
        Self::setup_with_config(mode, ProxyConfig::default()).await
    }

    /// Start with a custom proxy configuration.
    ///
    /// Host, port and upstream URL are overridden to point at loopback.
    pub async fn setup_with_config(mode: UpstreamMode, mut config: ProxyConfig) -> Self {
        let upstream = FakePohApi::start(mode).await;

        config.server.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.server.port = 0;
        config.upstream.base_url = upstream.base_url();

        let mut proxy = ProxyBuilder::new(config)
            .build()
            .await
            .expect("proxy should build");
        let proxy_addr = proxy.local_addr();
        let shutdown = proxy.shutdown_handle();
        let server = tokio::spawn(async move { proxy.run().await });

        info!("Test proxy on {proxy_addr}, upstream at {}", upstream.base_url());

        Self {
            upstream,
            proxy_addr,
            shutdown,
            server,
            http: reqwest::Client::new(),
        }
    }

    /// The fake upstream.
    pub fn upstream(&self) -> &FakePohApi {
        &self.upstream
    }

    /// Issue `GET <path>` against the proxy and decode the JSON body.
    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .http
            .get(format!("http://{}{path}", self.proxy_addr))
            .send()
            .await
            .expect("proxy reachable");
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.expect("json body");
        (status, body)
    }

    /// `GET /verify?address=<address>`.
    pub async fn verify(&self, address: &str) -> (u16, Value) {
        self.get(&format!("/verify?address={address}")).await
    }

    /// Stop the proxy and wait for it to exit.
    pub async fn teardown(self) {
        let Self {
            upstream,
            shutdown,
            server,
            http,
            ..
        } = self;
        drop(http);

        let _ = shutdown.send(true);
        let result = server.await.expect("server task joined");
        drop(upstream);
        assert!(result.is_ok(), "proxy exited with error: {result:?}");
    }
}
