//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net / http subsystems produce:
//!     → logging.rs (structured tracing events with connection_id, peer_addr)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
