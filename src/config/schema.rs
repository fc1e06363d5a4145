//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Identity-claim headers copied from a successful authorization response
/// when a route does not list its own.
pub const DEFAULT_FORWARD_HEADERS: [&str; 7] = [
    "x-remote-user-uuid",
    "remote-user-uuid",
    "x-remote-user-id",
    "remote-user-id",
    "x-remote-user",
    "remote-user",
    "authorization",
];

/// Root configuration for the forward-auth gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to protected upstreams.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed per client request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Route configuration: which requests go to which upstream, and through which gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact match).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// Base URL of the protected resource (e.g., "http://127.0.0.1:3000").
    pub upstream: String,

    /// Authorization gate in front of the upstream. Absent = unprotected route.
    #[serde(default)]
    pub forward_auth: Option<ForwardAuthConfig>,
}

/// Forward-auth gate settings for a route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ForwardAuthConfig {
    /// Authorization endpoint. Required, non-empty.
    pub url: String,

    /// Headers copied from a 200 authorization response onto the request
    /// handed to the upstream. An explicit empty list copies nothing.
    #[serde(default = "default_forward_headers")]
    pub forward_headers: Vec<String>,
}

impl Default for ForwardAuthConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            forward_headers: default_forward_headers(),
        }
    }
}

fn default_forward_headers() -> Vec<String> {
    DEFAULT_FORWARD_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
