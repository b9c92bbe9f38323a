//! Scriptable stand-in for the Linea PoH API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::{Path, State};
use axum::http::{header::ACCEPT, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the fake API answers.
#[derive(Debug, Clone)]
pub enum UpstreamMode {
    /// 200 with the given plain-text body.
    Body(String),
    /// Non-success status with the given body.
    Status(u16, String),
}

#[derive(Debug)]
struct FakeState {
    mode: Mutex<UpstreamMode>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, Option<String>)>>,
}

/// A running fake PoH API.
pub struct FakePohApi {
    state: Arc<FakeState>,
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl FakePohApi {
    /// Start the fake API on an ephemeral loopback port.
    pub async fn start(mode: UpstreamMode) -> Self {
        let state = Arc::new(FakeState {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });

        let router = Router::new()
            .route("/poh/v2/:address", get(answer))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("local addr");

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { state, addr, task }
    }

    /// Base URL to configure as `upstream.base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}/poh/v2", self.addr)
    }

    /// Change how subsequent requests are answered.
    pub fn set_mode(&self, mode: UpstreamMode) {
        *self.state.mode.lock() = mode;
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Address path segment and `Accept` header of the latest request.
    pub fn last_request(&self) -> Option<(String, Option<String>)> {
        self.state.last_request.lock().clone()
    }
}

impl Drop for FakePohApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(
    State(state): State<Arc<FakeState>>,
    Path(address): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let accept = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_request.lock() = Some((address, accept));

    match state.mode.lock().clone() {
        UpstreamMode::Body(body) => (StatusCode::OK, body),
        UpstreamMode::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        ),
    }
}
