//! Forwarded-context derivation.
//!
//! # Responsibilities
//! - Derive the canonical forwarded host of an inbound request
//! - Derive the forwarded client address of an inbound request
//! - Build the header set sent to the authorization service
//!
//! # Design Decisions
//! - Derivation functions are pure and total: they always yield a value
//! - An upstream hop's `x-forwarded-host` wins over the local `host` header
//! - A trusted edge's `cf-connecting-ip` wins over client-supplied `x-forwarded-for`
//! - Multi-valued inbound headers are forwarded with every value

use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    Version,
};

use crate::net::ClientConnection;

pub const X_FORWARDED_METHOD: HeaderName = HeaderName::from_static("x-forwarded-method");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_URI: HeaderName = HeaderName::from_static("x-forwarded-uri");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");

/// First non-empty textual value of a header.
fn non_empty<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

/// Canonical host of the original request.
///
/// Precedence: `x-forwarded-host`, `host`, the request-target authority
/// (HTTP/2 `:authority` or absolute-form), then the local address the
/// connection was accepted on.
pub fn forwarded_host(parts: &Parts, conn: &ClientConnection) -> String {
    non_empty(&parts.headers, &X_FORWARDED_HOST)
        .or_else(|| non_empty(&parts.headers, &header::HOST))
        .map(str::to_owned)
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_owned()))
        .unwrap_or_else(|| conn.resolved_host())
}

/// Client address of the original request.
///
/// Precedence: `cf-connecting-ip`, `x-forwarded-for`, the raw peer address.
pub fn forwarded_for(headers: &HeaderMap, conn: &ClientConnection) -> String {
    non_empty(headers, &CF_CONNECTING_IP)
        .or_else(|| non_empty(headers, &X_FORWARDED_FOR))
        .map(str::to_owned)
        .unwrap_or_else(|| conn.peer_ip())
}

/// Protocol string of the inbound request, e.g. `HTTP/1.1`.
pub fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Request-target as received: path plus query.
pub fn request_target(parts: &Parts) -> &str {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

/// Inbound headers that never travel to the authorization service.
/// `host` is re-derived for the authorization URL; framing headers describe
/// a body the GET does not carry.
fn is_dropped(name: &HeaderName) -> bool {
    name == header::HOST || name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING
}

fn to_header_value(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(value).ok()
}

/// Headers for the outbound authorization request.
///
/// Returns the header set and the derived forwarded host, which the allow
/// path stamps onto the request handed to the protected resource.
pub fn auth_request_headers(parts: &Parts, conn: &ClientConnection) -> (HeaderMap, String) {
    let mut headers = HeaderMap::with_capacity(parts.headers.len() + 5);
    for (name, value) in parts.headers.iter() {
        if !is_dropped(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let host = forwarded_host(parts, conn);
    let client = forwarded_for(&parts.headers, conn);

    headers.insert(
        X_FORWARDED_METHOD,
        HeaderValue::from_str(parts.method.as_str()).unwrap_or(HeaderValue::from_static("GET")),
    );
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(protocol(parts.version)));
    if let Some(uri) = to_header_value(request_target(parts)) {
        headers.insert(X_FORWARDED_URI, uri);
    }
    match to_header_value(&host) {
        Some(value) => {
            headers.insert(X_FORWARDED_HOST, value);
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }
    match to_header_value(&client) {
        Some(value) => {
            headers.insert(X_FORWARDED_FOR, value);
        }
        None => {
            headers.remove(X_FORWARDED_FOR);
        }
    }

    (headers, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn conn() -> ClientConnection {
        ClientConnection::new(
            "192.0.2.10:40000".parse().unwrap(),
            "127.0.0.1:8080".parse().unwrap(),
        )
    }

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_forwarded_host_prefers_upstream_hop() {
        let p = parts(
            Request::builder()
                .uri("/dashboard")
                .header("x-forwarded-host", "public.example.com")
                .header("host", "internal:8080"),
        );
        assert_eq!(forwarded_host(&p, &conn()), "public.example.com");
    }

    #[test]
    fn test_forwarded_host_uses_host_header() {
        let p = parts(Request::builder().uri("/dashboard").header("host", "localhost"));
        assert_eq!(forwarded_host(&p, &conn()), "localhost");
    }

    #[test]
    fn test_forwarded_host_skips_empty_values() {
        let p = parts(
            Request::builder()
                .uri("/")
                .header("x-forwarded-host", "")
                .header("host", "app.example.com"),
        );
        assert_eq!(forwarded_host(&p, &conn()), "app.example.com");
    }

    #[test]
    fn test_forwarded_values_pass_through_untrimmed() {
        let mut p = parts(Request::builder().uri("/"));
        p.headers
            .insert("x-forwarded-host", HeaderValue::from_static(" app.example.com "));
        p.headers
            .insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7, 10.0.0.1"));
        p.headers.insert("cf-connecting-ip", HeaderValue::from_static("   "));

        assert_eq!(forwarded_host(&p, &conn()), " app.example.com ");
        assert_eq!(forwarded_for(&p.headers, &conn()), " 203.0.113.7, 10.0.0.1");
    }

    #[test]
    fn test_forwarded_host_falls_back_to_authority_then_connection() {
        let p = parts(Request::builder().uri("http://origin.example.com/path"));
        assert_eq!(forwarded_host(&p, &conn()), "origin.example.com");

        let p = parts(Request::builder().uri("/path"));
        assert_eq!(forwarded_host(&p, &conn()), "127.0.0.1:8080");
    }

    #[test]
    fn test_forwarded_for_precedence() {
        let p = parts(
            Request::builder()
                .header("cf-connecting-ip", "203.0.113.1")
                .header("x-forwarded-for", "198.51.100.7"),
        );
        assert_eq!(forwarded_for(&p.headers, &conn()), "203.0.113.1");

        let p = parts(Request::builder().header("x-forwarded-for", "198.51.100.7"));
        assert_eq!(forwarded_for(&p.headers, &conn()), "198.51.100.7");

        let p = parts(Request::builder());
        assert_eq!(forwarded_for(&p.headers, &conn()), "192.0.2.10");
    }

    #[test]
    fn test_auth_request_headers() {
        let p = parts(
            Request::builder()
                .method("POST")
                .uri("/api/items?page=2")
                .version(Version::HTTP_11)
                .header("host", "localhost")
                .header("cookie", "session=abc")
                .header("content-length", "12")
                .header("x-forwarded-method", "spoofed"),
        );
        let (headers, host) = auth_request_headers(&p, &conn());

        assert_eq!(host, "localhost");
        assert!(headers.get("host").is_none());
        assert!(headers.get("content-length").is_none());
        assert_eq!(headers["cookie"], "session=abc");
        assert_eq!(headers["x-forwarded-method"], "POST");
        assert_eq!(headers.get_all("x-forwarded-method").iter().count(), 1);
        assert_eq!(headers["x-forwarded-proto"], "HTTP/1.1");
        assert_eq!(headers["x-forwarded-uri"], "/api/items?page=2");
        assert_eq!(headers["x-forwarded-host"], "localhost");
        assert_eq!(headers["x-forwarded-for"], "192.0.2.10");
    }

    #[test]
    fn test_multi_valued_headers_preserved() {
        let p = parts(
            Request::builder()
                .uri("/")
                .header("accept", "text/html")
                .header("accept", "application/json"),
        );
        let (headers, _) = auth_request_headers(&p, &conn());
        let values: Vec<_> = headers.get_all("accept").iter().collect();
        assert_eq!(values, vec!["text/html", "application/json"]);
    }

    #[test]
    fn test_protocol_strings() {
        assert_eq!(protocol(Version::HTTP_10), "HTTP/1.0");
        assert_eq!(protocol(Version::HTTP_2), "HTTP/2.0");
    }
}
