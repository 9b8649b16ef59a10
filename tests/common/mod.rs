//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use edge_gateway::config::{GatewayConfig, OriginConfig};
use edge_gateway::gateway::EdgeHandler;
use edge_gateway::signing::{verify, IdentityCell, SigningIdentity};

pub const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
pub const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
pub const REGION: &str = "us-east-1";

/// Header the explicit-target strategy reads in tests.
pub const TARGET_HEADER: &str = "x-target-origin";

pub fn identity() -> SigningIdentity {
    SigningIdentity::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY, None, REGION)
}

/// What a mock backend saw in one call.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub signature_valid: bool,
}

/// Fixed behaviour of a mock backend.
#[derive(Debug, Clone)]
pub struct Behaviour {
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Duration,
}

impl Behaviour {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
struct BackendState {
    behaviour: Behaviour,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockBackend {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// `host:port` as the explicit-target header expects it.
    pub fn authority(&self) -> String {
        self.addr.to_string()
    }
}

/// Start a backend that checks every request's signature and answers
/// with `behaviour`.
pub async fn start_mock_backend(behaviour: Behaviour) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        behaviour,
        calls: calls.clone(),
        seen: seen.clone(),
    };

    let app = Router::new().fallback(backend_handler).with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, calls, seen }
}

async fn backend_handler(State(state): State<BackendState>, request: Request) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let request = axum::http::Request::from_parts(parts, body);
    let signature_valid = verify(&request, &identity(), "lambda").is_ok();

    state.seen.lock().unwrap().push(Seen {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        headers: request.headers().clone(),
        body: request.body().clone(),
        signature_valid,
    });

    if !state.behaviour.delay.is_zero() {
        tokio::time::sleep(state.behaviour.delay).await;
    }

    (state.behaviour.status, Body::from(state.behaviour.body)).into_response()
}

/// Explicit-target config over plain HTTP with short timeouts.
pub fn header_strategy_config(invocation_ms: u64) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.origin = OriginConfig::Header {
        header_name: TARGET_HEADER.into(),
        scheme: "http".into(),
    };
    config.timeouts.invocation_ms = invocation_ms;
    config.timeouts.trigger_deadline_ms = invocation_ms + 1000;
    config.timeouts.connect_ms = invocation_ms.min(1000);
    config
}

/// Handler signing with the fixed test identity.
pub fn handler_for(config: &GatewayConfig) -> Arc<EdgeHandler> {
    Arc::new(handler_signing_as(config, identity()))
}

/// Handler signing as `identity`, left unshared so tests can adjust it.
pub fn handler_signing_as(config: &GatewayConfig, identity: SigningIdentity) -> EdgeHandler {
    EdgeHandler::with_identity(config, Arc::new(IdentityCell::preloaded(identity))).unwrap()
}
