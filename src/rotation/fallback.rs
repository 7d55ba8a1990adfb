//! Cross-service fallback chains.
//!
//! # Responsibilities
//! - Hold the tiered preference order per capability category
//! - Find the tier to resume from after a group failed
//! - Walk tiers and groups, asking the selector for an endpoint
//!
//! # Design Decisions
//! - A tier that produced a failure is exhausted for that resolution, even
//!   if it has sibling groups
//! - Groups without endpoints are skipped, not treated as errors
//! - At most one group lock is held at any time

use std::collections::BTreeMap;
use std::ops::Range;
use tokio::time::Instant;

use crate::error::{RotationError, RotationResult};
use crate::health::availability::HealthPolicy;
use crate::registry::endpoint::SelectedEndpoint;
use crate::registry::pool::EndpointRegistry;
use crate::rotation::selector::select_endpoint;

/// Ordered tiers of equally-preferred service groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    tiers: Vec<Vec<String>>,
}

impl FallbackChain {
    pub fn new(tiers: Vec<Vec<String>>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Vec<String>] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Index of the first tier naming `group`.
    pub fn tier_of(&self, group: &str) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.iter().any(|g| g == group))
    }

    /// Tier to start from: the one after the failed group's tier, or 0.
    pub fn start_after(&self, failed_group: Option<&str>) -> usize {
        failed_group
            .and_then(|group| self.tier_of(group))
            .map(|tier| tier + 1)
            .unwrap_or(0)
    }

    /// Every group named by the chain, in tier order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().flatten().map(String::as_str)
    }
}

/// Fallback chains keyed by capability category. Read-only after startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackChains {
    chains: BTreeMap<String, FallbackChain>,
}

impl FallbackChains {
    pub fn new(chains: BTreeMap<String, FallbackChain>) -> Self {
        Self { chains }
    }

    pub fn get(&self, category: &str) -> RotationResult<&FallbackChain> {
        self.chains
            .get(category)
            .ok_or_else(|| RotationError::UnknownCapabilityCategory {
                category: category.to_string(),
            })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Every group named by any chain.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.chains.values().flat_map(FallbackChain::groups)
    }
}

impl From<&BTreeMap<String, Vec<Vec<String>>>> for FallbackChains {
    fn from(config: &BTreeMap<String, Vec<Vec<String>>>) -> Self {
        Self::new(
            config
                .iter()
                .map(|(category, tiers)| (category.clone(), FallbackChain::new(tiers.clone())))
                .collect(),
        )
    }
}

/// Walk `tiers` of `chain` in order and return the first selectable endpoint.
pub fn resolve_tiers(
    registry: &EndpointRegistry,
    category: &str,
    chain: &FallbackChain,
    tiers: Range<usize>,
    now: Instant,
    policy: &HealthPolicy,
) -> RotationResult<SelectedEndpoint> {
    let end = tiers.end.min(chain.len());
    for tier_index in tiers.start..end {
        for group_name in &chain.tiers()[tier_index] {
            let Some(group) = registry.group(group_name) else {
                tracing::debug!(category, group = %group_name, "Group not registered, skipping");
                continue;
            };
            match select_endpoint(group, now, policy) {
                Ok(endpoint) => {
                    tracing::debug!(
                        category,
                        tier = tier_index,
                        group = %group_name,
                        endpoint = %endpoint.name,
                        "Resolved endpoint"
                    );
                    return Ok(endpoint);
                }
                Err(e) => {
                    tracing::debug!(category, tier = tier_index, group = %group_name, reason = %e, "Group skipped");
                }
            }
        }
    }

    Err(RotationError::Unavailable {
        target: category.to_string(),
    })
}
