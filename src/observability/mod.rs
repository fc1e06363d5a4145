//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate decisions and upstream forwards produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the client through the gate to the authorization service
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
