//! Point-in-time health report.
//!
//! Built under each group's lock in turn, reading fields only. A
//! RateLimited endpoint whose reset instant has passed is reported as
//! RateLimited until the next selection flips it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::health::availability::{is_quarantined, HealthPolicy};
use crate::health::state::EndpointStatus;
use crate::registry::pool::EndpointRegistry;
use crate::registry::provider::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Unix milliseconds.
    pub generated_at: u64,
    pub services: BTreeMap<String, ServiceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub total: usize,
    pub active: usize,
    pub rate_limited: usize,
    pub error: usize,
    pub offline: usize,
    pub endpoints: Vec<EndpointReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointReport {
    pub name: String,
    pub kind: ProviderKind,
    pub status: EndpointStatus,
    pub error_count: u32,
    pub requests_made: u32,
    pub max_requests_per_window: u32,
    /// Unix milliseconds of the last selection.
    pub last_used: Option<u64>,
    pub quarantined: bool,
}

impl StatusReport {
    pub fn service(&self, group: &str) -> Option<&ServiceStatus> {
        self.services.get(group)
    }

    pub fn endpoint(&self, group: &str, name: &str) -> Option<&EndpointReport> {
        self.service(group)?.endpoints.iter().find(|e| e.name == name)
    }
}

/// Snapshot every group of `registry`.
pub fn snapshot(registry: &EndpointRegistry, policy: &HealthPolicy) -> StatusReport {
    let mut services = BTreeMap::new();

    for group in registry.groups() {
        let state = group.lock();
        let mut service = ServiceStatus {
            total: state.endpoints.len(),
            ..ServiceStatus::default()
        };

        for endpoint in &state.endpoints {
            match endpoint.status() {
                EndpointStatus::Active => service.active += 1,
                EndpointStatus::RateLimited => service.rate_limited += 1,
                EndpointStatus::Error => service.error += 1,
                EndpointStatus::Offline => service.offline += 1,
            }
            service.endpoints.push(EndpointReport {
                name: endpoint.name().to_string(),
                kind: endpoint.kind(),
                status: endpoint.status(),
                error_count: endpoint.error_count(),
                requests_made: endpoint.requests_made(),
                max_requests_per_window: endpoint.max_requests_per_window(),
                last_used: endpoint.last_used().map(unix_millis),
                quarantined: is_quarantined(endpoint, policy),
            });
        }
        drop(state);

        services.insert(group.name().to_string(), service);
    }

    StatusReport {
        generated_at: unix_millis(SystemTime::now()),
        services,
    }
}

fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
