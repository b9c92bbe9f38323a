//! Server lifecycle: bind, serve, periodic maintenance, graceful shutdown.

use crate::api::{build_router, AppState};
use crate::config::ProxyConfig;
use crate::error::{Error, Result};
use crate::verify::UpstreamClient;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Builder for constructing a proxy server.
pub struct ProxyBuilder {
    config: ProxyConfig,
    upstream: Option<Arc<dyn UpstreamClient>>,
}

impl ProxyBuilder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            upstream: None,
        }
    }

    /// Use a custom upstream client instead of the Linea PoH API.
    #[must_use]
    pub fn with_upstream(mut self, upstream: Arc<dyn UpstreamClient>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Validate configuration, build shared state and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP client
    /// cannot be built, or the listen address cannot be bound.
    pub async fn build(self) -> Result<RunningProxy> {
        info!("Building poh-proxy with config: {:?}", self.config);
        self.config.validate()?;

        let bind_addr = self.config.server.socket_addr();
        let state = match self.upstream {
            Some(upstream) => AppState::new(self.config, upstream),
            None => AppState::from_config(self.config)?,
        };

        let listener = TcpListener::bind(bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(RunningProxy {
            state,
            listener: Some(listener),
            local_addr,
            shutdown_tx,
            shutdown_rx,
        })
    }
}

/// A bound, ready-to-serve proxy.
pub struct RunningProxy {
    state: AppState,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RunningProxy {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared handler state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle that stops the server when sent `true`.
    #[must_use]
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Serve requests until shutdown is requested or Ctrl-C is received.
    ///
    /// After the signal, in-flight requests get `server.shutdown_grace_ms` to
    /// finish. Connections still open after that are abandoned, so a hung
    /// upstream call cannot block shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server was already run or fails while serving.
    pub async fn run(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| Error::Server("proxy already ran".to_string()))?;

        info!("poh-proxy listening on {}", self.local_addr);
        info!("Health check: http://{}/health", self.local_addr);
        info!("Verify endpoint: http://{}/verify?address=0x...", self.local_addr);

        let maintenance = self.spawn_maintenance();

        let router = build_router(self.state.clone());
        let mut shutdown_rx = self.shutdown_rx.clone();
        let shutdown_tx = self.shutdown_tx.clone();

        let serve = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    let _ = shutdown_tx.send(true);
                }
            }
        })
        .into_future();

        let mut grace_rx = self.shutdown_rx.clone();
        let grace = self.state.config.server.shutdown_grace();
        let drain_deadline = async move {
            wait_for_shutdown(&mut grace_rx).await;
            tokio::time::sleep(grace).await;
        };

        let result = tokio::select! {
            served = serve => served.map_err(|e| Error::Server(e.to_string())),
            () = drain_deadline => {
                warn!(
                    grace_ms = grace.as_millis(),
                    "In-flight requests still running after shutdown grace period, abandoning them"
                );
                Ok(())
            }
        };

        // Make sure the maintenance task observes shutdown on error paths too
        self.shutdown();
        let _ = maintenance.await;

        info!("poh-proxy shutdown complete");
        result
    }

    /// Request the server to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Periodically drop expired cache entries and idle rate-limit clients.
    fn spawn_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let state = self.state.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();
        let period = state
            .config
            .rate_limit
            .window()
            .max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = wait_for_shutdown(&mut shutdown_rx) => break,
                    _ = ticker.tick() => {
                        let expired = state.verifier.cache().purge_expired();
                        let idle = state.limiter.prune_idle();
                        debug!(expired, idle, "maintenance sweep");
                    }
                }
            }
        })
    }
}

/// Resolves once the watch value is `true` or the sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
