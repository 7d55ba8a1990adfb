//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single credentialed access path to a provider
//! - Track health state (status, error count, rate-limit reset)
//! - Track throughput within the current quota window
//!
//! Health fields are only mutated through the crate-internal transition
//! methods below, which keep the invariants:
//! - the rate-limit reset instant is set iff status is RateLimited
//! - the request counter resets when leaving RateLimited or on error reset

use std::time::SystemTime;
use tokio::time::{Duration, Instant};
use url::Url;

use crate::health::state::{EndpointStatus, RecoveryOutcome};
use crate::registry::provider::{Credential, ProviderKind};

/// Registration data for one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: Url,
    pub credential: Credential,
    /// Request ceiling per quota window; 0 disables quota enforcement.
    pub max_requests_per_window: u32,
}

impl EndpointSpec {
    /// Spec using the kind's default base address and quota.
    pub fn with_defaults(name: impl Into<String>, kind: ProviderKind, credential: Credential) -> Self {
        let base_url = Url::parse(kind.default_base_url()).expect("built-in base URLs are valid");
        Self {
            name: name.into(),
            kind,
            base_url,
            credential,
            max_requests_per_window: kind.default_quota(),
        }
    }
}

/// A registered endpoint with its mutable health record.
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    kind: ProviderKind,
    base_url: Url,
    credential: Credential,
    max_requests_per_window: u32,

    status: EndpointStatus,
    error_count: u32,
    rate_limit_reset: Option<Instant>,
    last_used: Option<SystemTime>,
    requests_made: u32,
    window_started: Option<Instant>,
}

impl Endpoint {
    pub fn new(spec: EndpointSpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            base_url: spec.base_url,
            credential: spec.credential,
            max_requests_per_window: spec.max_requests_per_window,
            status: EndpointStatus::Active,
            error_count: 0,
            rate_limit_reset: None,
            last_used: None,
            requests_made: 0,
            window_started: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn status(&self) -> EndpointStatus {
        self.status
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn rate_limit_reset(&self) -> Option<Instant> {
        self.rate_limit_reset
    }

    pub fn last_used(&self) -> Option<SystemTime> {
        self.last_used
    }

    pub fn requests_made(&self) -> u32 {
        self.requests_made
    }

    pub fn max_requests_per_window(&self) -> u32 {
        self.max_requests_per_window
    }

    /// Owned copy of the identity fields handed to callers.
    pub fn to_selected(&self, group: &str) -> SelectedEndpoint {
        SelectedEndpoint {
            group: group.to_string(),
            name: self.name.clone(),
            kind: self.kind,
            base_url: self.base_url.clone(),
            credential: self.credential.clone(),
        }
    }

    // --- Transitions ---

    pub(crate) fn record_use(&mut self, now: Instant) {
        self.last_used = Some(SystemTime::now());
        self.requests_made = self.requests_made.saturating_add(1);
        self.window_started.get_or_insert(now);
    }

    /// Count a failure. Returns false when the endpoint is Offline, which
    /// keeps its status.
    pub(crate) fn mark_error(&mut self) -> bool {
        self.error_count = self.error_count.saturating_add(1);
        if self.status == EndpointStatus::Offline {
            return false;
        }
        self.status = EndpointStatus::Error;
        self.rate_limit_reset = None;
        true
    }

    /// Returns false, changing nothing, when the endpoint is Offline.
    pub(crate) fn mark_rate_limited(&mut self, reset_at: Instant) -> bool {
        if self.status == EndpointStatus::Offline {
            return false;
        }
        self.status = EndpointStatus::RateLimited;
        self.rate_limit_reset = Some(reset_at);
        true
    }

    pub(crate) fn mark_offline(&mut self) {
        self.status = EndpointStatus::Offline;
        self.rate_limit_reset = None;
    }

    /// Leave RateLimited once the reset instant has passed.
    pub(crate) fn clear_rate_limit(&mut self) {
        self.status = EndpointStatus::Active;
        self.rate_limit_reset = None;
        self.requests_made = 0;
        self.window_started = None;
    }

    /// Start a fresh quota window if the current one has elapsed.
    pub(crate) fn roll_window(&mut self, now: Instant, window: Duration) {
        if let Some(started) = self.window_started {
            if now.saturating_duration_since(started) >= window {
                self.requests_made = 0;
                self.window_started = None;
            }
        }
    }

    pub(crate) fn quota_exhausted(&self) -> bool {
        self.max_requests_per_window > 0 && self.requests_made >= self.max_requests_per_window
    }

    pub(crate) fn reset_errors(&mut self) {
        self.error_count = 0;
        self.requests_made = 0;
        self.window_started = None;
        if self.status == EndpointStatus::Error {
            self.status = EndpointStatus::Active;
        }
    }

    /// Manual reactivation: the only way out of Offline.
    pub(crate) fn reactivate(&mut self) {
        self.status = EndpointStatus::Active;
        self.error_count = 0;
        self.rate_limit_reset = None;
        self.requests_made = 0;
        self.window_started = None;
    }

    /// Scheduled reinstatement after the error cooldown.
    pub(crate) fn recover(&mut self) -> RecoveryOutcome {
        match self.status {
            EndpointStatus::Offline => RecoveryOutcome::SkippedOffline,
            EndpointStatus::RateLimited => {
                self.error_count = 0;
                RecoveryOutcome::KeptRateLimited
            }
            EndpointStatus::Active | EndpointStatus::Error => {
                self.status = EndpointStatus::Active;
                self.error_count = 0;
                RecoveryOutcome::Reinstated
            }
        }
    }
}

/// Identity of a selected endpoint, detached from its health record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedEndpoint {
    pub group: String,
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: Url,
    pub credential: Credential,
}
