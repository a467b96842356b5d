//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler and chunk planner produce:
//!     → logging.rs (structured log events, request id on every line)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```

pub mod logging;
pub mod metrics;
