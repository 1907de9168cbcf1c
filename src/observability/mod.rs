//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! startup, resolver, lifecycle
//!     → logging.rs (tracing subscriber, JSON or pretty on stdout)
//!
//! access_log middleware (one event per request, target "access")
//!     → logging.rs
//!     → metrics.rs (request counter, latency histogram)
//!         → Prometheus listener, only when enabled
//! ```
//!
//! # Design Decisions
//! - The access log carries the request ID assigned at the edge
//! - The exporter is opt-in and has its own listener

pub mod logging;
pub mod metrics;
