//! Forwarding to the protected resource.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the route's upstream
//! - Forward method, headers (original `Host` included) and body unchanged
//! - Map upstream connection failures to 502

use axum::{
    body::Body,
    http::{
        uri::{PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Pooled client for upstream requests.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamClient {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Forward `request` to `upstream`, keeping path and query.
    pub async fn forward(&self, upstream: &Uri, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        let uri = match rewrite_uri(upstream, &parts.uri) {
            Some(uri) => uri,
            None => {
                tracing::error!(upstream = %upstream, uri = %parts.uri, "Cannot build upstream URI");
                return (StatusCode::BAD_GATEWAY, "Invalid upstream").into_response();
            }
        };
        parts.uri = uri;
        // The legacy client picks the wire version itself.
        parts.version = axum::http::Version::HTTP_11;

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(upstream = %upstream, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Join the upstream base (scheme, authority, optional path prefix) with the
/// request's path and query.
pub fn rewrite_uri(upstream: &Uri, original: &Uri) -> Option<Uri> {
    let base = upstream.path().trim_end_matches('/');
    let tail = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let path_and_query: PathAndQuery = format!("{}{}", base, tail).parse().ok()?;

    let authority = upstream.authority()?.clone();

    Uri::builder()
        .scheme(upstream.scheme().cloned().unwrap_or(Scheme::HTTP))
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_uri() {
        let upstream: Uri = "http://127.0.0.1:3000".parse().unwrap();
        let original: Uri = "/dashboard?tab=2".parse().unwrap();
        assert_eq!(
            rewrite_uri(&upstream, &original).unwrap().to_string(),
            "http://127.0.0.1:3000/dashboard?tab=2"
        );
    }

    #[test]
    fn test_rewrite_uri_with_base_path() {
        let upstream: Uri = "http://backend:8000/app/".parse().unwrap();
        let original: Uri = "http://public.example.com/x/y".parse().unwrap();
        assert_eq!(
            rewrite_uri(&upstream, &original).unwrap().to_string(),
            "http://backend:8000/app/x/y"
        );
    }
}
