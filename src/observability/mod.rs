//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine operations produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! On demand:
//!     → status.rs (point-in-time health report)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint
//!     → admin API and `--print-status`
//! ```
//!
//! # Design Decisions
//! - Every log event carries `group` / `endpoint` / `category` fields
//! - Metric updates are fire-and-forget; no recorder means no-op
//! - Status reports never mutate health state

pub mod logging;
pub mod metrics;
pub mod status;

pub use status::{EndpointReport, ServiceStatus, StatusReport};
