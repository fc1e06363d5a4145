//! Route table.
//!
//! # Responsibilities
//! - Compile route configs into matchers, ordered by priority
//! - Provision one forward-auth gate per protected route
//! - Find the first route matching a request

use std::sync::Arc;

use axum::http::{request::Parts, Uri};

use crate::config::validation::parse_upstream;
use crate::config::RouteConfig;
use crate::forward_auth::{ForwardAuthGate, GateError, GateResult};
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub priority: u32,
    pub upstream: Uri,
    pub gate: Option<Arc<ForwardAuthGate>>,
    matcher: AndMatcher,
}

impl Route {
    /// Compile a route, building its gate when `forward_auth` is set.
    pub fn from_config(config: &RouteConfig) -> GateResult<Self> {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &config.host {
            matchers.push(Box::new(HostMatcher::new(host.clone())));
        }
        if let Some(prefix) = &config.path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }

        let upstream = parse_upstream(&config.upstream)
            .map_err(|e| GateError::Config(format!("route '{}': {}", config.name, e)))?;

        let gate = match &config.forward_auth {
            Some(auth) => Some(Arc::new(ForwardAuthGate::from_config(&config.name, auth)?)),
            None => None,
        };

        Ok(Self {
            name: config.name.clone(),
            priority: config.priority,
            upstream,
            gate,
            matcher: AndMatcher::new(matchers),
        })
    }

    pub fn matches(&self, req: &Parts) -> bool {
        self.matcher.matches(req)
    }

    pub fn is_protected(&self) -> bool {
        self.gate.is_some()
    }
}

/// Immutable, priority-ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile all routes. Fails if any gate cannot be installed.
    pub fn from_config(configs: &[RouteConfig]) -> GateResult<Self> {
        let mut routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<GateResult<Vec<_>>>()?;
        // Stable sort keeps config order among equal priorities.
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));

        for route in &routes {
            tracing::info!(
                route = %route.name,
                upstream = %route.upstream,
                protected = route.is_protected(),
                "Route compiled"
            );
        }
        Ok(Self { routes })
    }

    /// First route (by priority) matching the request.
    pub fn match_request(&self, req: &Parts) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(req))
    }
}
