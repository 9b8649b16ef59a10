//! HTTP trigger adapter.
//!
//! # Responsibilities
//! - Accept requests from the delivery network over plain HTTP
//! - Buffer the body and hand an `InboundRequest` to the handler
//! - Wire up middleware (tracing, request ID, trigger deadline)
//! - Shut down gracefully when asked
//!
//! # Design Decisions
//! - Every method and path goes to the same handler
//! - The trigger deadline is enforced by a layer; the handler's own
//!   invocation deadline is shorter, so a 504 always wins the race
//! - A client disconnect drops the handler future and the backend call

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::gateway::EdgeHandler;
use crate::http::request::{InboundRequest, X_REQUEST_ID};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<EdgeHandler>,
    pub max_body_bytes: usize,
}

/// HTTP server exposing the gateway handler.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a cold-started handler.
    pub fn new(handler: Arc<EdgeHandler>, max_body_bytes: usize) -> Self {
        let deadline = handler.budget().trigger_deadline();
        let state = AppState {
            handler,
            max_body_bytes,
        };
        Self {
            router: Self::build_router(state, deadline),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, deadline: std::time::Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(deadline)),
            )
    }

    /// Router for in-process use (tests, embedding).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request and run it through the gateway.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = state.max_body_bytes,
                error = %e,
                "Request body rejected"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let inbound = InboundRequest::with_raw_query(
        parts.method,
        parts.uri.path(),
        parts.uri.query(),
        parts.headers,
        body,
    );

    state.handler.handle(inbound).await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, OriginConfig};
    use crate::signing::{IdentityCell, SigningIdentity};
    use tower::ServiceExt;

    fn router() -> Router {
        let mut config = GatewayConfig::default();
        config.origin = OriginConfig::Static { backend_url: None };
        let identity = Arc::new(IdentityCell::preloaded(SigningIdentity::new(
            "AKID", "secret", None, "us-east-1",
        )));
        let handler = EdgeHandler::with_identity(&config, identity).unwrap();
        HttpServer::new(Arc::new(handler), 1024).into_router()
    }

    #[tokio::test]
    async fn test_unconfigured_origin_is_bad_gateway() {
        let response = router()
            .oneshot(Request::builder().uri("/any/path").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(X_REQUEST_ID, "edge-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "edge-42");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(vec![0u8; 4096]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
