//! Endpoint rotation subsystem.
//!
//! # Data Flow
//! ```text
//! resolve(category, failed_group?)
//!     → fallback.rs (look up chain, compute start tier)
//!     → for each tier, for each group:
//!         → selector.rs (sticky cursor, scan forward on unavailability)
//!             → health::availability (per-endpoint decision)
//!     → SelectedEndpoint or RotationError::Unavailable
//! ```
//!
//! # Design Decisions
//! - Selection is sticky: the same endpoint serves until it degrades
//! - The cursor lives in the group, guarded by the group's lock
//! - Unhealthy endpoints are skipped, never removed

pub mod fallback;
pub mod selector;

pub use fallback::{FallbackChain, FallbackChains};
pub use selector::select_endpoint;
