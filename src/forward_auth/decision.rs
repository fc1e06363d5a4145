//! Authorization decision engine.
//!
//! # Data Flow
//! ```text
//! inbound request parts + connection
//!     → headers.rs (outbound header set, derived forwarded host)
//!     → client.rs (single GET to the authorization service)
//!     → status == 200 → Allow { augmented copy of inbound headers }
//!     → otherwise     → Deny  { authorization response, verbatim }
//! ```
//!
//! The inbound request is never mutated here. Allow carries a new header
//! set for the caller to install on the request it hands onward.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName},
        request::Parts,
        HeaderMap, HeaderValue, Response, StatusCode,
    },
};
use std::sync::Arc;
use url::Url;

use crate::forward_auth::client::AuthClient;
use crate::forward_auth::error::{GateError, GateResult};
use crate::forward_auth::headers::{auth_request_headers, X_FORWARDED_HOST};
use crate::net::ClientConnection;

/// Outcome of a single authorization check.
#[derive(Debug)]
pub enum Decision {
    /// Continue to the protected resource with these request headers.
    Allow { headers: HeaderMap },
    /// Answer the client with the authorization service's response.
    Deny(Response<Body>),
}

impl Decision {
    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Allow { .. } => "allow",
            Decision::Deny(_) => "deny",
        }
    }
}

/// Runs authorization checks against one authorization endpoint.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    url: Url,
    forward_headers: Arc<[HeaderName]>,
    client: AuthClient,
}

impl DecisionEngine {
    pub fn new(url: Url, forward_headers: Vec<HeaderName>, client: AuthClient) -> Self {
        Self {
            url,
            forward_headers: forward_headers.into(),
            client,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn forward_headers(&self) -> &[HeaderName] {
        &self.forward_headers
    }

    /// Consult the authorization service about an inbound request.
    ///
    /// Transport failures are returned as errors; there is no fallback
    /// decision in either direction.
    pub async fn decide(&self, parts: &Parts, conn: &ClientConnection) -> GateResult<Decision> {
        let (outbound, forwarded_host) = auth_request_headers(parts, conn);

        let response = self.client.check(&self.url, outbound).await?;
        let status = response.status();

        if status == StatusCode::OK {
            let headers = self.allow_headers(&parts.headers, response.headers(), &forwarded_host);
            return Ok(Decision::Allow { headers });
        }

        let denial = deny_response(response).await?;
        Ok(Decision::Deny(denial))
    }

    /// Inbound headers plus allow-listed claims plus the canonical forwarded host.
    fn allow_headers(
        &self,
        inbound: &HeaderMap,
        auth: &HeaderMap,
        forwarded_host: &str,
    ) -> HeaderMap {
        let mut headers = inbound.clone();
        for name in self.forward_headers.iter() {
            if let Some(value) = auth.get(name).filter(|v| !v.is_empty()) {
                headers.insert(name.clone(), value.clone());
            }
        }
        if let Ok(host) = HeaderValue::from_str(forwarded_host) {
            headers.insert(X_FORWARDED_HOST, host);
        }
        headers
    }
}

/// Hop-by-hop headers describe the connection to the authorization service,
/// not the denial. The buffered body is re-framed by the server from its length.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == header::CONNECTION
        || *name == "keep-alive"
        || *name == header::TE
        || *name == header::TRAILER
        || *name == header::TRANSFER_ENCODING
        || *name == header::UPGRADE
}

/// Every end-to-end header value of the authorization response, duplicates included.
fn denial_headers(auth: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(auth.len());
    for (name, value) in auth.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Copy status, headers, and the body bytes of the authorization response
/// into a client response.
async fn deny_response(response: reqwest::Response) -> GateResult<Response<Body>> {
    let status = response.status();
    let headers = denial_headers(response.headers());
    let body = response.bytes().await.map_err(GateError::Transport)?;

    let mut denial = Response::new(Body::from(body));
    *denial.status_mut() = status;
    *denial.headers_mut() = headers;
    Ok(denial)
}
