//! The rotation engine: the single entry point callers share.
//!
//! # Responsibilities
//! - Own the registry, fallback chains and health policy
//! - Expose selection, resolution and health signalling
//! - Feed the recovery scheduler when endpoints fail
//!
//! # Design Decisions
//! - Constructed once by the composition root, shared via `Arc`
//! - Health signals for unknown endpoints are logged no-ops
//! - No I/O and no lock held across an await

use std::fmt::Display;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::loader::ConfigError;
use crate::config::schema::EngineConfig;
use crate::config::validation::validate_config;
use crate::error::{RotationError, RotationResult};
use crate::health::availability::{self, deadline_after, HealthPolicy};
use crate::health::recovery::{RecoveryHandle, RecoveryScheduler};
use crate::health::state::EndpointStatus;
use crate::observability::metrics;
use crate::observability::status::{self, StatusReport};
use crate::registry::endpoint::SelectedEndpoint;
use crate::registry::group::GroupState;
use crate::registry::pool::EndpointRegistry;
use crate::rotation::fallback::{resolve_tiers, FallbackChains};
use crate::rotation::selector::{self, advance_past};

/// Shared engine state.
#[derive(Debug)]
pub struct RotationEngine {
    registry: Arc<EndpointRegistry>,
    chains: FallbackChains,
    policy: HealthPolicy,
    recovery: RecoveryHandle,
}

impl RotationEngine {
    /// Create an engine and the recovery scheduler it feeds.
    ///
    /// The scheduler must be spawned for failed endpoints to come back.
    pub fn new(registry: EndpointRegistry, chains: FallbackChains, policy: HealthPolicy) -> (Self, RecoveryScheduler) {
        let registry = Arc::new(registry);
        let (recovery, scheduler) = RecoveryScheduler::new(registry.clone());

        for group in registry.groups() {
            let state = group.lock();
            for endpoint in &state.endpoints {
                metrics::record_endpoint_available(group.name(), endpoint.name(), true);
            }
        }

        let engine = Self {
            registry,
            chains,
            policy,
            recovery,
        };
        (engine, scheduler)
    }

    /// Build from a resolved configuration.
    ///
    /// Every group named by a chain exists afterwards, even without endpoints.
    pub fn from_config(config: &EngineConfig) -> Result<(Self, RecoveryScheduler), ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let mut builder = EndpointRegistry::builder();
        for tiers in config.chains.values() {
            for group in tiers.iter().flatten() {
                builder.declare_group(group);
            }
        }
        for endpoint in &config.endpoints {
            if let Some(spec) = endpoint.to_spec() {
                builder.register(&endpoint.group, spec)?;
            }
        }

        let chains = FallbackChains::from(&config.chains);
        let policy = HealthPolicy::from(&config.health);
        Ok(Self::new(builder.build(), chains, policy))
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn chains(&self) -> &FallbackChains {
        &self.chains
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Sticky selection within one service group.
    pub fn select_endpoint(&self, group: &str) -> RotationResult<SelectedEndpoint> {
        let Some(service) = self.registry.group(group) else {
            return Err(RotationError::NoEndpointsConfigured {
                group: group.to_string(),
            });
        };
        let result = selector::select_endpoint(service, Instant::now(), &self.policy);
        metrics::record_selection(group, result.is_ok());
        result
    }

    /// Walk the category's chain, starting after the tier of `failed_group`.
    pub fn resolve(&self, category: &str, failed_group: Option<&str>) -> RotationResult<SelectedEndpoint> {
        let chain = self.chains.get(category)?;
        let start = chain.start_after(failed_group);
        if let Some(failed) = failed_group {
            tracing::info!(category, failed_group = failed, start_tier = start, "Falling back past failed group");
        }

        match resolve_tiers(&self.registry, category, chain, start..chain.len(), Instant::now(), &self.policy) {
            Ok(endpoint) => {
                let path = if chain.tier_of(&endpoint.group) == Some(0) { "primary" } else { "fallback" };
                metrics::record_resolution(category, path);
                Ok(endpoint)
            }
            Err(e) => {
                tracing::warn!(category, "All fallback tiers exhausted");
                metrics::record_resolution(category, "exhausted");
                Err(e)
            }
        }
    }

    /// Try tier 0, then every later tier, reporting which one served.
    pub fn resolve_with_primary(&self, category: &str) -> RotationResult<SelectedEndpoint> {
        let chain = self.chains.get(category)?;
        let now = Instant::now();

        if let Ok(endpoint) = resolve_tiers(&self.registry, category, chain, 0..1, now, &self.policy) {
            tracing::debug!(category, group = %endpoint.group, endpoint = %endpoint.name, "Served by primary tier");
            metrics::record_resolution(category, "primary");
            return Ok(endpoint);
        }

        match resolve_tiers(&self.registry, category, chain, 1..chain.len(), now, &self.policy) {
            Ok(endpoint) => {
                tracing::info!(category, group = %endpoint.group, endpoint = %endpoint.name, "Primary tier unavailable, served by fallback");
                metrics::record_resolution(category, "fallback");
                Ok(endpoint)
            }
            Err(e) => {
                tracing::warn!(category, "Primary and fallback tiers exhausted");
                metrics::record_resolution(category, "exhausted");
                Err(e)
            }
        }
    }

    /// Record a failed call and schedule reinstatement after the cooldown.
    ///
    /// If the endpoint was the group's sticky choice, the cursor moves to
    /// the next usable sibling right away. A failure on an endpoint that is
    /// no longer under the cursor leaves the cursor alone on purpose, so a
    /// late report cannot skip a healthy sibling. An Offline endpoint only
    /// has its error counted. Returns false for unknown endpoints.
    pub fn mark_error(&self, group: &str, endpoint: &str, cause: impl Display) -> bool {
        let now = Instant::now();
        let policy = self.policy;
        let marked = self.with_endpoint(group, endpoint, "mark_error", |state, index| {
            let ep = &mut state.endpoints[index];
            let applied = ep.mark_error();
            let error_count = ep.error_count();
            let next = if applied && state.cursor == index {
                advance_past(group, state, index, now, &policy)
            } else {
                None
            };
            (applied, error_count, next.map(|i| state.endpoints[i].name().to_string()))
        });
        let Some((applied, error_count, next)) = marked else {
            return false;
        };

        metrics::record_endpoint_error(group, endpoint);
        if !applied {
            tracing::info!(group, endpoint, error_count, cause = %cause, "Failure reported for offline endpoint, status kept");
            return true;
        }

        tracing::warn!(group, endpoint, error_count, cause = %cause, "Endpoint call failed");
        if let Some(next) = next {
            tracing::info!(group, from = endpoint, to = %next, "Rotated away from failed endpoint");
        }
        metrics::record_endpoint_available(group, endpoint, false);

        self.recovery
            .schedule(group, endpoint, deadline_after(now, policy.recovery_cooldown));
        true
    }

    /// Mark an endpoint rate limited until `reset_at`, or for the policy's
    /// default duration when the provider gave no reset time.
    ///
    /// Offline endpoints are left untouched.
    pub fn mark_rate_limited(&self, group: &str, endpoint: &str, reset_at: Option<Instant>) -> bool {
        let now = Instant::now();
        let reset_at = reset_at.unwrap_or_else(|| deadline_after(now, self.policy.rate_limit_reset));
        let Some(applied) = self.with_endpoint(group, endpoint, "mark_rate_limited", |state, index| {
            state.endpoints[index].mark_rate_limited(reset_at)
        }) else {
            return false;
        };

        if !applied {
            tracing::info!(group, endpoint, "Rate limit reported for offline endpoint, status kept");
            return true;
        }

        let reset_in = reset_at.saturating_duration_since(now);
        tracing::warn!(group, endpoint, reset_in_secs = reset_in.as_secs(), "Endpoint rate limited");
        metrics::record_rate_limited(group, endpoint);
        metrics::record_endpoint_available(group, endpoint, false);
        true
    }

    /// Take an endpoint out of rotation until [`reactivate`](Self::reactivate).
    pub fn mark_offline(&self, group: &str, endpoint: &str) -> bool {
        let marked = self
            .with_endpoint(group, endpoint, "mark_offline", |state, index| {
                state.endpoints[index].mark_offline();
            })
            .is_some();

        if marked {
            tracing::warn!(group, endpoint, "Endpoint taken offline");
            metrics::record_endpoint_available(group, endpoint, false);
        }
        marked
    }

    /// Return an endpoint to Active with clean counters, whatever its state.
    pub fn reactivate(&self, group: &str, endpoint: &str) -> bool {
        let marked = self
            .with_endpoint(group, endpoint, "reactivate", |state, index| {
                state.endpoints[index].reactivate();
            })
            .is_some();

        if marked {
            tracing::info!(group, endpoint, "Endpoint reactivated");
            metrics::record_endpoint_available(group, endpoint, true);
        }
        marked
    }

    /// Clear error counts in one group, or in every group when `None`.
    ///
    /// Offline endpoints keep their status. Returns how many endpoints were
    /// touched.
    pub fn reset_errors(&self, group: Option<&str>) -> usize {
        let groups: Vec<_> = match group {
            Some(name) => match self.registry.group(name) {
                Some(service) => vec![service],
                None => {
                    tracing::warn!(group = name, "reset_errors on unknown group ignored");
                    return 0;
                }
            },
            None => self.registry.groups().collect(),
        };

        let mut touched = 0;
        for service in groups {
            let mut state = service.lock();
            for endpoint in state.endpoints.iter_mut() {
                endpoint.reset_errors();
                if endpoint.status() == EndpointStatus::Active {
                    metrics::record_endpoint_available(service.name(), endpoint.name(), true);
                }
                touched += 1;
            }
        }

        tracing::info!(group = group.unwrap_or("*"), endpoints = touched, "Error counts reset");
        touched
    }

    /// Availability of one endpoint right now, or `None` if unknown.
    ///
    /// Applies the lazy rate-limit reset like selection does.
    pub fn is_available(&self, group: &str, endpoint: &str) -> Option<bool> {
        let now = Instant::now();
        let service = self.registry.group(group)?;
        let mut state = service.lock();
        let index = state.position(endpoint)?;
        let ep = &mut state.endpoints[index];
        let before = ep.status();
        let available = availability::is_available(ep, now, &self.policy);
        availability::publish_transition(group, ep, before);
        Some(available)
    }

    pub fn snapshot(&self) -> StatusReport {
        status::snapshot(&self.registry, &self.policy)
    }

    fn with_endpoint<R>(
        &self,
        group: &str,
        endpoint: &str,
        operation: &'static str,
        f: impl FnOnce(&mut GroupState, usize) -> R,
    ) -> Option<R> {
        let found = self.registry.group(group).and_then(|service| {
            let mut state = service.lock();
            let index = state.position(endpoint)?;
            Some(f(&mut *state, index))
        });
        if found.is_none() {
            tracing::warn!(group, endpoint, operation, "Unknown endpoint, ignoring");
        }
        found
    }
}
