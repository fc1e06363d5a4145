//! Gate handler: the boundary between the host pipeline and the decision engine.
//!
//! # Responsibilities
//! - Construct a validated gate from route configuration
//! - Run one decision per inbound request
//! - Invoke the continuation exactly once on allow, never otherwise
//! - Expose the gate as an axum middleware

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::config::schema::ForwardAuthConfig;
use crate::config::validation::{parse_auth_url, parse_forward_headers};
use crate::forward_auth::client::AuthClient;
use crate::forward_auth::decision::{Decision, DecisionEngine};
use crate::forward_auth::error::{GateError, GateResult};
use crate::net::ClientConnection;
use crate::observability::metrics;

/// Forward-auth gate for one route.
#[derive(Debug, Clone)]
pub struct ForwardAuthGate {
    route: String,
    engine: DecisionEngine,
}

impl ForwardAuthGate {
    /// Validate the configuration and provision the authorization client.
    pub fn from_config(route: impl Into<String>, config: &ForwardAuthConfig) -> GateResult<Self> {
        Self::with_client(route, config, AuthClient::new()?)
    }

    /// Same as [`from_config`](Self::from_config) with a caller-provided client.
    pub fn with_client(
        route: impl Into<String>,
        config: &ForwardAuthConfig,
        client: AuthClient,
    ) -> GateResult<Self> {
        let url = parse_auth_url(&config.url).map_err(GateError::Config)?;
        let forward_headers =
            parse_forward_headers(&config.forward_headers).map_err(GateError::Config)?;

        Ok(Self {
            route: route.into(),
            engine: DecisionEngine::new(url, forward_headers, client),
        })
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Authorize `request`, then either hand it to `next` or answer with the denial.
    pub async fn serve<F, Fut>(
        &self,
        request: Request<Body>,
        conn: &ClientConnection,
        next: F,
    ) -> GateResult<Response>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let started = Instant::now();
        let (mut parts, body) = request.into_parts();

        let decision = match self.engine.decide(&parts, conn).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(
                    route = %self.route,
                    auth_url = %self.engine.url(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Authorization request failed"
                );
                metrics::record_decision(&self.route, "error", started);
                return Err(e);
            }
        };
        metrics::record_decision(&self.route, decision.outcome(), started);

        match decision {
            Decision::Allow { headers } => {
                tracing::debug!(
                    route = %self.route,
                    method = %parts.method,
                    uri = %parts.uri,
                    "Authorization granted"
                );
                parts.headers = headers;
                Ok(next(Request::from_parts(parts, body)).await)
            }
            Decision::Deny(response) => {
                tracing::info!(
                    route = %self.route,
                    method = %parts.method,
                    uri = %parts.uri,
                    status = response.status().as_u16(),
                    "Authorization denied"
                );
                Ok(response)
            }
        }
    }
}

/// Axum middleware running a [`ForwardAuthGate`] in front of the inner service.
///
/// Install with `axum::middleware::from_fn_with_state(Arc::new(gate), forward_auth_middleware)`.
/// Requires the server to be built with `ConnectInfo<ClientConnection>`.
pub async fn forward_auth_middleware(
    State(gate): State<Arc<ForwardAuthGate>>,
    ConnectInfo(conn): ConnectInfo<ClientConnection>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    gate.serve(request, &conn, |req| next.run(req)).await
}
