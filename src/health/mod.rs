//! Endpoint health subsystem.
//!
//! # Data Flow
//! ```text
//! Selection (availability.rs):
//!     Selector asks about an endpoint
//!     → roll quota window, rate-limit if exhausted
//!     → lazy RateLimited → Active once the reset instant passed
//!
//! Failure reported (engine::mark_error):
//!     → Endpoint enters Error, cursor moves on
//!     → recovery.rs queues a reinstatement at now + cooldown
//!
//! Recovery (recovery.rs):
//!     Single task, time-ordered queue
//!     → reinstate unless Offline
//! ```
//!
//! # Design Decisions
//! - Health is per endpoint; groups only own the cursor
//! - Offline is immune to scheduled recovery
//! - Thresholds and timings come from one global policy

pub mod availability;
pub mod recovery;
pub mod state;

pub use availability::{is_available, is_quarantined, HealthPolicy};
pub use recovery::{RecoveryHandle, RecoveryScheduler};
pub use state::{EndpointStatus, RecoveryOutcome};
