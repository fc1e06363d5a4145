//! Forward-auth gateway library.
//!
//! Every request on a protected route is checked against an external
//! authorization service before it reaches the upstream. A 200 lets it
//! through with identity-claim headers attached; anything else is answered
//! with the authorization service's own response.

pub mod config;
pub mod forward_auth;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use forward_auth::{forward_auth_middleware, Decision, ForwardAuthGate, GateError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::ClientConnection;
