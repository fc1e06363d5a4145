//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Json, Router};
use forward_auth::config::{ForwardAuthConfig, GatewayConfig, RouteConfig};
use forward_auth::http::HttpServer;
use forward_auth::lifecycle::Shutdown;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Request head as received by the mock authorization service.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    fn parse(raw: &str) -> Self {
        let mut lines = raw.split("\r\n");
        let mut request_line = lines.next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();
        let headers = lines
            .take_while(|l| !l.is_empty())
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        Self { method, target, headers }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_all(name).into_iter().next()
    }

    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// A mock authorization service answering every request with a fixed response.
pub struct MockAuth {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockAuth {
    pub async fn next_request(&mut self) -> CapturedRequest {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("auth service was not called")
            .expect("auth service channel closed")
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Format a raw HTTP/1.1 response.
pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", status_line);
    for (k, v) in headers {
        out.push_str(&format!("{}: {}\r\n", k, v));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}

/// Format a raw HTTP/1.1 response whose body is sent with chunked framing.
pub fn chunked_response(status_line: &str, headers: &[(&str, &str)], chunks: &[&str]) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", status_line);
    for (k, v) in headers {
        out.push_str(&format!("{}: {}\r\n", k, v));
    }
    out.push_str("Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n");
    for chunk in chunks {
        out.push_str(&format!("{:x}\r\n{}\r\n", chunk.len(), chunk));
    }
    out.push_str("0\r\n\r\n");
    out
}

pub async fn start_auth_server(response: String) -> MockAuth {
    start_slow_auth_server(response, Duration::ZERO).await
}

/// Start a mock authorization service that waits `delay` before answering.
pub async fn start_slow_auth_server(response: String, delay: Duration) -> MockAuth {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let hits = Arc::new(AtomicUsize::new(0));
    let response = Arc::new(response);

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            let counter = counter.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(CapturedRequest::parse(&String::from_utf8_lossy(&buf)));

                tokio::time::sleep(delay).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockAuth {
        url: format!("http://{}/verify", addr),
        hits,
        requests: rx,
    }
}

/// URL of a port nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/verify", addr)
}

/// A protected resource that echoes what it received as JSON.
pub struct MockUpstream {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn echo(request: Request<Body>) -> Json<Value> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in request.headers() {
        headers
            .entry(k.as_str().to_string())
            .or_default()
            .push(v.to_str().unwrap_or_default().to_string());
    }
    Json(json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "headers": headers,
    }))
}

pub async fn start_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    let app = Router::new().fallback(move |req: Request<Body>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            echo(req).await
        }
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream {
        url: format!("http://{}", addr),
        hits,
    }
}

pub fn protected_route(name: &str, upstream: &str, auth_url: &str, forward: &[&str]) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        host: None,
        path_prefix: Some("/".to_string()),
        priority: 0,
        upstream: upstream.to_string(),
        forward_auth: Some(ForwardAuthConfig {
            url: auth_url.to_string(),
            forward_headers: forward.iter().map(|h| h.to_string()).collect(),
        }),
    }
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(routes: Vec<RouteConfig>) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.routes = routes;

    let server = HttpServer::new(config).expect("gateway config rejected");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
