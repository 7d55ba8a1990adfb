//! Sticky round-robin selection within one service group.
//!
//! The endpoint under the cursor keeps serving until it stops being
//! selectable; only then does the scan move forward, wrapping around, and
//! the cursor follows the endpoint it lands on.

use tokio::time::Instant;

use crate::error::{RotationError, RotationResult};
use crate::health::availability::{check_selectable, HealthPolicy};
use crate::registry::endpoint::SelectedEndpoint;
use crate::registry::group::{GroupState, ServiceGroup};

/// Pick the next usable endpoint of `group` and account for its use.
pub fn select_endpoint(
    group: &ServiceGroup,
    now: Instant,
    policy: &HealthPolicy,
) -> RotationResult<SelectedEndpoint> {
    let mut state = group.lock();
    let len = state.endpoints.len();
    if len == 0 {
        return Err(RotationError::NoEndpointsConfigured {
            group: group.name().to_string(),
        });
    }

    let start = state.cursor % len;
    if check_selectable(group.name(), &mut state.endpoints[start], now, policy) {
        let endpoint = &mut state.endpoints[start];
        endpoint.record_use(now);
        tracing::debug!(group = %group.name(), endpoint = %endpoint.name(), "Continuing with current endpoint");
        return Ok(endpoint.to_selected(group.name()));
    }

    tracing::info!(group = %group.name(), "Current endpoint unavailable, rotating");
    for offset in 1..len {
        let index = (start + offset) % len;
        if check_selectable(group.name(), &mut state.endpoints[index], now, policy) {
            state.cursor = index;
            let endpoint = &mut state.endpoints[index];
            endpoint.record_use(now);
            tracing::info!(group = %group.name(), endpoint = %endpoint.name(), "Rotated to endpoint");
            return Ok(endpoint.to_selected(group.name()));
        }
    }

    tracing::warn!(group = %group.name(), endpoints = len, "No endpoint available after full rotation");
    Err(RotationError::Unavailable {
        target: group.name().to_string(),
    })
}

/// Move the cursor to the first selectable sibling after `failed`.
///
/// Returns the new cursor, or `None` (cursor untouched) when no sibling can
/// serve.
pub(crate) fn advance_past(
    group: &str,
    state: &mut GroupState,
    failed: usize,
    now: Instant,
    policy: &HealthPolicy,
) -> Option<usize> {
    let len = state.endpoints.len();
    for offset in 1..len {
        let index = (failed + offset) % len;
        if check_selectable(group, &mut state.endpoints[index], now, policy) {
            state.cursor = index;
            return Some(index);
        }
    }
    None
}
