//! Endpoint registry.
//!
//! # Responsibilities
//! - Collect endpoints per service group at startup
//! - Freeze the structure once built (no runtime add/remove)
//! - Provide lookup for selection, health signals and reporting

use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::registry::endpoint::{Endpoint, EndpointSpec, SelectedEndpoint};
use crate::registry::group::ServiceGroup;

/// Startup-only builder. Consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    groups: BTreeMap<String, Vec<Endpoint>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a group exists, even if nothing is registered in it.
    pub fn declare_group(&mut self, group: &str) -> &mut Self {
        self.groups.entry(group.to_string()).or_default();
        self
    }

    /// Append an endpoint to a group.
    pub fn register(&mut self, group: &str, spec: EndpointSpec) -> Result<&mut Self, RegistryError> {
        let endpoints = self.groups.entry(group.to_string()).or_default();
        if endpoints.iter().any(|e| e.name() == spec.name) {
            return Err(RegistryError::DuplicateEndpoint {
                group: group.to_string(),
                name: spec.name,
            });
        }
        endpoints.push(Endpoint::new(spec));
        Ok(self)
    }

    pub fn build(self) -> EndpointRegistry {
        let groups: BTreeMap<String, ServiceGroup> = self
            .groups
            .into_iter()
            .map(|(name, endpoints)| (name.clone(), ServiceGroup::new(name, endpoints)))
            .collect();

        let total: usize = groups.values().map(ServiceGroup::len).sum();
        tracing::info!(groups = groups.len(), endpoints = total, "Endpoint registry built");
        for group in groups.values().filter(|g| !g.is_empty()) {
            tracing::debug!(group = %group.name(), endpoints = group.len(), "Service group loaded");
        }

        EndpointRegistry { groups }
    }
}

/// All service groups, structurally immutable after construction.
#[derive(Debug)]
pub struct EndpointRegistry {
    groups: BTreeMap<String, ServiceGroup>,
}

impl EndpointRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn group(&self, name: &str) -> Option<&ServiceGroup> {
        self.groups.get(name)
    }

    /// Groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &ServiceGroup> {
        self.groups.values()
    }

    /// Endpoints of a group in registration order; empty for unknown groups.
    pub fn list_endpoints(&self, group: &str) -> Vec<SelectedEndpoint> {
        self.group(group)
            .map(ServiceGroup::list_endpoints)
            .unwrap_or_default()
    }

    pub fn find(&self, group: &str, endpoint_name: &str) -> Result<SelectedEndpoint, RegistryError> {
        let not_found = || RegistryError::NotFound {
            group: group.to_string(),
            name: endpoint_name.to_string(),
        };
        let service = self.group(group).ok_or_else(not_found)?;
        let state = service.lock();
        let found = state
            .endpoints
            .iter()
            .find(|e| e.name() == endpoint_name)
            .map(|e| e.to_selected(group));
        found.ok_or_else(not_found)
    }

    pub fn endpoint_count(&self) -> usize {
        self.groups.values().map(ServiceGroup::len).sum()
    }
}
