//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Build engine → Spawn recovery scheduler → Start admin/metrics
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → scheduler drops pending recoveries
//!                                 → admin server stops accepting
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Pending recoveries are abandoned on shutdown; health state is in-memory only
//! - Shutdown waits for background tasks, bounded by a deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
