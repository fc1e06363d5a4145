//! Authorization service client.
//!
//! # Design Decisions
//! - Fixed 5 second budget per authorization call
//! - Redirects are never followed: a 3xx is a denial passed to the client,
//!   not a hop to wherever the authorization service points
//! - One pooled client per gate, shared by all in-flight decisions
//! - Environment proxies are ignored; the authorization URL is dialed directly

use std::time::Duration;

use axum::http::HeaderMap;
use reqwest::{redirect, Client, Response};
use url::Url;

use crate::forward_auth::error::{GateError, GateResult};

/// Time budget for a single authorization round trip.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled HTTP client that talks to the authorization service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
}

impl AuthClient {
    /// Build a client with the standard [`AUTH_TIMEOUT`].
    pub fn new() -> GateResult<Self> {
        Self::with_timeout(AUTH_TIMEOUT)
    }

    /// Build a client with a custom time budget.
    pub fn with_timeout(timeout: Duration) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(GateError::Client)?;
        Ok(Self { client })
    }

    /// Issue the authorization check: a GET with exactly `headers` and no body.
    pub async fn check(&self, url: &Url, headers: HeaderMap) -> GateResult<Response> {
        self.client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(GateError::Transport)
    }
}
