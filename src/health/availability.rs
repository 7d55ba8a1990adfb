//! Availability decisions.
//!
//! # Responsibilities
//! - Decide whether an endpoint may serve a request right now
//! - Apply the lazy RateLimited → Active transition on read
//! - Enforce per-endpoint request quotas before selection
//!
//! # Design Decisions
//! - Offline is never available; only manual reactivation clears it
//! - Error below the quarantine threshold is still "available", but the
//!   selector avoids Error endpoints until they are reinstated
//! - No clocks are read here; callers pass `now`

use tokio::time::{Duration, Instant};

use crate::config::HealthConfig;
use crate::health::state::EndpointStatus;
use crate::observability::metrics;
use crate::registry::endpoint::Endpoint;

/// Upper bound on any cooldown, reset or window the engine schedules.
pub const MAX_HEALTH_DELAY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Thresholds and timings governing endpoint health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    /// Error endpoints with more errors than this are quarantined.
    pub quarantine_threshold: u32,
    /// Delay before a failed endpoint is reinstated.
    pub recovery_cooldown: Duration,
    /// Rate-limit duration when the caller gives no reset instant.
    pub rate_limit_reset: Duration,
    /// Length of the request-quota window.
    pub quota_window: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            quarantine_threshold: 5,
            recovery_cooldown: Duration::from_secs(60),
            rate_limit_reset: Duration::from_secs(60),
            quota_window: Duration::from_secs(60),
        }
    }
}

impl From<&HealthConfig> for HealthPolicy {
    fn from(config: &HealthConfig) -> Self {
        Self {
            quarantine_threshold: config.quarantine_threshold,
            recovery_cooldown: Duration::from_secs(config.recovery_cooldown_secs),
            rate_limit_reset: Duration::from_secs(config.rate_limit_reset_secs),
            quota_window: Duration::from_secs(config.quota_window_secs),
        }
    }
}

/// Whether `endpoint` may serve a request at `now`.
///
/// Side effect: a RateLimited endpoint whose reset instant has passed is
/// flipped back to Active with a zeroed request counter.
pub fn is_available(endpoint: &mut Endpoint, now: Instant, policy: &HealthPolicy) -> bool {
    match endpoint.status() {
        EndpointStatus::Offline => false,
        EndpointStatus::RateLimited => match endpoint.rate_limit_reset() {
            Some(reset_at) if now > reset_at => {
                endpoint.clear_rate_limit();
                tracing::info!(endpoint = %endpoint.name(), "Rate limit expired, endpoint active again");
                true
            }
            _ => false,
        },
        EndpointStatus::Error => !is_quarantined(endpoint, policy),
        EndpointStatus::Active => true,
    }
}

/// True when the endpoint has failed too often to be used before recovery.
pub fn is_quarantined(endpoint: &Endpoint, policy: &HealthPolicy) -> bool {
    endpoint.status() == EndpointStatus::Error && endpoint.error_count() > policy.quarantine_threshold
}

/// Rotation predicate that also publishes any status change it caused.
pub(crate) fn check_selectable(group: &str, endpoint: &mut Endpoint, now: Instant, policy: &HealthPolicy) -> bool {
    let before = endpoint.status();
    let selectable = is_selectable(endpoint, now, policy);
    publish_transition(group, endpoint, before);
    selectable
}

/// Emit metrics for a status change made while checking availability.
pub(crate) fn publish_transition(group: &str, endpoint: &Endpoint, before: EndpointStatus) {
    match (before, endpoint.status()) {
        (EndpointStatus::RateLimited, EndpointStatus::Active) => {
            metrics::record_endpoint_available(group, endpoint.name(), true);
        }
        (EndpointStatus::Active, EndpointStatus::RateLimited) => {
            metrics::record_rate_limited(group, endpoint.name());
            metrics::record_endpoint_available(group, endpoint.name(), false);
        }
        _ => {}
    }
}

/// `now + delay`, with the delay capped at [`MAX_HEALTH_DELAY`].
pub fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay.min(MAX_HEALTH_DELAY)).unwrap_or(now)
}

/// Rotation predicate: available, and not waiting on error recovery.
pub(crate) fn is_selectable(endpoint: &mut Endpoint, now: Instant, policy: &HealthPolicy) -> bool {
    enforce_quota(endpoint, now, policy);
    is_available(endpoint, now, policy) && endpoint.status() != EndpointStatus::Error
}

/// Roll the quota window and rate-limit the endpoint once its ceiling is hit.
pub(crate) fn enforce_quota(endpoint: &mut Endpoint, now: Instant, policy: &HealthPolicy) {
    if endpoint.status() != EndpointStatus::Active {
        return;
    }
    endpoint.roll_window(now, policy.quota_window);
    if endpoint.quota_exhausted() {
        endpoint.mark_rate_limited(deadline_after(now, policy.quota_window));
        tracing::warn!(
            endpoint = %endpoint.name(),
            requests = endpoint.requests_made(),
            limit = endpoint.max_requests_per_window(),
            "Request quota exhausted, endpoint rate limited"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::endpoint::EndpointSpec;
    use crate::registry::provider::{Credential, ProviderKind};

    fn endpoint_with_quota(quota: u32) -> Endpoint {
        let mut spec = EndpointSpec::with_defaults("gemini_1", ProviderKind::Gemini, Credential::new("k"));
        spec.max_requests_per_window = quota;
        Endpoint::new(spec)
    }

    #[test]
    fn test_active_available() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        assert!(is_available(&mut ep, Instant::now(), &policy));
        assert!(is_available(&mut ep, Instant::now(), &policy));
    }

    #[test]
    fn test_offline_never_available() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        ep.mark_offline();
        let later = Instant::now() + Duration::from_secs(3600);
        assert!(!is_available(&mut ep, later, &policy));
    }

    #[test]
    fn test_rate_limit_lazy_reset() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        let now = Instant::now();
        ep.record_use(now);
        ep.record_use(now);
        ep.mark_rate_limited(now - Duration::from_secs(1));

        assert!(is_available(&mut ep, now, &policy));
        assert_eq!(ep.status(), EndpointStatus::Active);
        assert_eq!(ep.requests_made(), 0);
        assert!(ep.rate_limit_reset().is_none());
    }

    #[test]
    fn test_rate_limit_still_pending() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        let now = Instant::now();
        ep.mark_rate_limited(now + Duration::from_secs(30));

        assert!(!is_available(&mut ep, now, &policy));
        // Reset instant itself is not "past"
        assert!(!is_available(&mut ep, now + Duration::from_secs(30), &policy));
        assert_eq!(ep.status(), EndpointStatus::RateLimited);
        assert!(is_available(&mut ep, now + Duration::from_secs(31), &policy));
    }

    #[test]
    fn test_quarantine_threshold() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        let now = Instant::now();

        for _ in 0..5 {
            ep.mark_error();
        }
        assert_eq!(ep.error_count(), 5);
        assert!(is_available(&mut ep, now, &policy));
        assert!(!is_quarantined(&ep, &policy));

        ep.mark_error();
        assert_eq!(ep.error_count(), 6);
        assert!(!is_available(&mut ep, now, &policy));
        assert!(is_quarantined(&ep, &policy));

        ep.reset_errors();
        assert!(is_available(&mut ep, now, &policy));
        assert_eq!(ep.status(), EndpointStatus::Active);
    }

    #[test]
    fn test_error_endpoint_not_selectable() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(10);
        ep.mark_error();
        let now = Instant::now();
        assert!(is_available(&mut ep, now, &policy));
        assert!(!is_selectable(&mut ep, now, &policy));
    }

    #[test]
    fn test_quota_exhaustion_rate_limits() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(2);
        let now = Instant::now();

        assert!(is_selectable(&mut ep, now, &policy));
        ep.record_use(now);
        assert!(is_selectable(&mut ep, now, &policy));
        ep.record_use(now);

        assert!(!is_selectable(&mut ep, now, &policy));
        assert_eq!(ep.status(), EndpointStatus::RateLimited);

        let after_window = now + policy.quota_window + Duration::from_millis(1);
        assert!(is_selectable(&mut ep, after_window, &policy));
        assert_eq!(ep.requests_made(), 0);
    }

    #[test]
    fn test_deadline_is_capped() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, Duration::from_secs(5)), now + Duration::from_secs(5));
        assert_eq!(deadline_after(now, Duration::from_secs(u64::MAX)), now + MAX_HEALTH_DELAY);
        assert_eq!(deadline_after(now, Duration::MAX), now + MAX_HEALTH_DELAY);
    }

    #[test]
    fn test_quota_window_rolls_before_limit() {
        let policy = HealthPolicy::default();
        let mut ep = endpoint_with_quota(2);
        let start = Instant::now();
        ep.record_use(start);
        ep.record_use(start);

        // Window elapsed before the next selection: counter resets instead
        let later = start + policy.quota_window;
        assert!(is_selectable(&mut ep, later, &policy));
        assert_eq!(ep.status(), EndpointStatus::Active);
        assert_eq!(ep.requests_made(), 0);
    }
}
