//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum accept loop (http::server)
//!     → connection.rs (peer + local address captured once per connection)
//!     → attached to every request as ConnectInfo<ClientConnection>
//! ```
//!
//! # Design Decisions
//! - Connection metadata is captured at accept time, never re-derived per request
//! - The local address doubles as the host of last resort for forwarded-host derivation

pub mod connection;

pub use connection::ClientConnection;
