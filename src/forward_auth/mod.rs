//! Forward-auth subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (+ ClientConnection)
//!     → gate.rs (boundary, continuation handling)
//!     → decision.rs (one check, binary branch on status)
//!         → headers.rs (x-forwarded-* derivation, outbound header set)
//!         → client.rs (GET to authorization URL, 5s, no redirects)
//!     → Allow: continuation runs with augmented headers
//!     → Deny:  authorization response returned verbatim
//!     → Error: propagated, continuation never runs (fail closed)
//! ```

pub mod client;
pub mod decision;
pub mod error;
pub mod gate;
pub mod headers;

pub use client::{AuthClient, AUTH_TIMEOUT};
pub use decision::{Decision, DecisionEngine};
pub use error::{GateError, GateResult};
pub use gate::{forward_auth_middleware, ForwardAuthGate};
