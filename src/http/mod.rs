//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (ConnectInfo<ClientConnection>)
//!     → server.rs (Axum setup, layers, route lookup)
//!     → request.rs (request ID assigned and propagated)
//!     → forward_auth gate (protected routes only)
//!     → upstream.rs (continuation: forward to protected resource)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod upstream;

pub use request::{request_id, X_REQUEST_ID};
pub use server::HttpServer;
pub use upstream::UpstreamClient;
