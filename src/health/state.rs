//! Endpoint health state machine.
//!
//! # States
//! - Active: endpoint receives traffic
//! - RateLimited: provider quota exhausted until a reset instant
//! - Error: a call failed; avoided by rotation until reinstated
//! - Offline: manually disabled; only an explicit reactivation brings it back
//!
//! # State Transitions
//! ```text
//! Active      → RateLimited: quota exceeded or provider said so
//! RateLimited → Active:      now > reset instant (lazy, on read)
//! Active      → Error:       call failure reported
//! Error       → Active:      cooldown elapsed (scheduled) or errors reset
//! *           → Offline:     manual assertion
//! Offline     → Active:      manual reactivation only
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status of a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    #[default]
    Active,
    RateLimited,
    Error,
    Offline,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointStatus::Active => "active",
            EndpointStatus::RateLimited => "rate_limited",
            EndpointStatus::Error => "error",
            EndpointStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a scheduled reinstatement did when it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Status set back to Active and error count cleared.
    Reinstated,
    /// Endpoint is Offline; automatic recovery never overrides that.
    SkippedOffline,
    /// Endpoint is rate limited; error count cleared, rate limit kept.
    KeptRateLimited,
}

impl RecoveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryOutcome::Reinstated => "reinstated",
            RecoveryOutcome::SkippedOffline => "skipped_offline",
            RecoveryOutcome::KeptRateLimited => "kept_rate_limited",
        }
    }
}
