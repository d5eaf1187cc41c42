//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is set per request and echoed back
//! - Metrics are cheap (atomic increments) and off unless enabled

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
