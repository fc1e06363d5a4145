//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Capture per-connection metadata for the gates
//! - Dispatch requests to routes, through their gates, to upstreams

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::forward_auth::GateResult;
use crate::http::request::{request_id, X_REQUEST_ID};
use crate::http::upstream::UpstreamClient;
use crate::net::ClientConnection;
use crate::observability::metrics;
use crate::routing::Router as GatewayRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<GatewayRouter>,
    pub upstream: UpstreamClient,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server, compiling routes and installing their gates.
    ///
    /// Fails when any gate configuration is invalid; no request is served then.
    pub fn new(config: GatewayConfig) -> GateResult<Self> {
        let gateway_router = Arc::new(GatewayRouter::from_config(&config.routes)?);

        let state = AppState {
            router: gateway_router,
            upstream: UpstreamClient::new(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<ClientConnection>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Looks up the route, runs its gate if any, and forwards to the upstream.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(conn): ConnectInfo<ClientConnection>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request_id(request.headers()).to_string();

    let (parts, body) = request.into_parts();
    let route = match state.router.match_request(&parts) {
        Some(r) => r,
        None => {
            tracing::warn!(request_id = %request_id, path = %parts.uri.path(), "No route matched");
            metrics::record_request(&method, 404, "none", start_time);
            return (StatusCode::NOT_FOUND, "No matching route found").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        route = %route.name,
        method = %method,
        path = %parts.uri.path(),
        peer = %conn.peer,
        "Routing request"
    );

    let request = Request::from_parts(parts, body);
    let upstream = &state.upstream;
    let target = &route.upstream;

    let response = match &route.gate {
        Some(gate) => gate
            .serve(request, &conn, |req| upstream.forward(target, req))
            .await
            .unwrap_or_else(IntoResponse::into_response),
        None => upstream.forward(target, request).await,
    };

    metrics::record_request(&method, response.status().as_u16(), &route.name, start_time);
    response
}
