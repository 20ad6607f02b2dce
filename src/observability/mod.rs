//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver and dispatcher produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through HTTP trace spans
//! - Metrics are cheap (atomic increments)
//! - Degraded lookups are visible here, never as request failures

pub mod logging;
pub mod metrics;
