//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle/group.rs, http/server.rs produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty, compact or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric calls are no-ops until a recorder is installed
//! - Log level comes from RUST_LOG first, then from config

pub mod logging;
pub mod metrics;
