//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Authorization URLs present, absolute, http(s)
//! - Forward-header names are valid HTTP header names
//! - Upstreams are absolute http URLs, route names unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{header::HeaderName, Uri};
use thiserror::Error;
use url::Url;

use crate::config::schema::{ForwardAuthConfig, GatewayConfig, RouteConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route '{route}': {message}")]
    Route { route: String, message: String },

    #[error("listener: {0}")]
    Listener(String),
}

/// Parse an authorization endpoint URL.
pub fn parse_auth_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("forward_auth <url> not specified".to_string());
    }
    let url = Url::parse(raw).map_err(|e| format!("invalid forward_auth url '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported forward_auth url scheme '{}'", other)),
    }
}

/// Parse forward-header names, normalized to lowercase.
pub fn parse_forward_headers(names: &[String]) -> Result<Vec<HeaderName>, String> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
                .map_err(|_| format!("invalid forward header name '{}'", name))
        })
        .collect()
}

/// Parse an upstream base URL. Only plain http upstreams are dialed.
pub fn parse_upstream(raw: &str) -> Result<Uri, String> {
    let uri: Uri = raw
        .parse()
        .map_err(|e| format!("invalid upstream '{}': {}", raw, e))?;
    if uri.scheme_str() != Some("http") || uri.authority().is_none() {
        return Err(format!("upstream '{}' must be an absolute http:// URL", raw));
    }
    Ok(uri)
}

fn validate_forward_auth(auth: &ForwardAuthConfig) -> Vec<String> {
    let mut problems = Vec::new();
    if let Err(e) = parse_auth_url(&auth.url) {
        problems.push(e);
    }
    if let Err(e) = parse_forward_headers(&auth.forward_headers) {
        problems.push(e);
    }
    problems
}

fn validate_route(route: &RouteConfig) -> Vec<String> {
    let mut problems = Vec::new();
    if route.upstream.trim().is_empty() {
        problems.push("upstream not specified".to_string());
    } else if let Err(e) = parse_upstream(&route.upstream) {
        problems.push(e);
    }
    if let Some(prefix) = &route.path_prefix {
        if !prefix.starts_with('/') {
            problems.push(format!("path_prefix '{}' must start with '/'", prefix));
        }
    }
    if let Some(auth) = &route.forward_auth {
        problems.extend(validate_forward_auth(auth));
    }
    problems
}

/// Validate the whole configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Listener(
            "request_timeout_secs must be greater than 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::Route {
                route: route.name.clone(),
                message: "name must not be empty".to_string(),
            });
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::Route {
                route: route.name.clone(),
                message: "duplicate route name".to_string(),
            });
        }

        errors.extend(validate_route(route).into_iter().map(|message| ValidationError::Route {
            route: route.name.clone(),
            message,
        }));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
