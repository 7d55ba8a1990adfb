//! Service groups.
//!
//! A group owns an insertion-ordered list of endpoints and one rotation
//! cursor, both behind the group's own mutex. Nothing in the engine holds
//! two group locks at once.

use std::sync::{Mutex, MutexGuard};

use crate::registry::endpoint::{Endpoint, SelectedEndpoint};

/// Mutable state of a group, only reachable through [`ServiceGroup::lock`].
#[derive(Debug, Default)]
pub(crate) struct GroupState {
    pub(crate) endpoints: Vec<Endpoint>,
    /// Index of the sticky endpoint; always `< endpoints.len()` when non-empty.
    pub(crate) cursor: usize,
}

impl GroupState {
    pub(crate) fn position(&self, endpoint_name: &str) -> Option<usize> {
        self.endpoints.iter().position(|e| e.name() == endpoint_name)
    }
}

/// A named collection of interchangeable endpoints.
#[derive(Debug)]
pub struct ServiceGroup {
    name: String,
    state: Mutex<GroupState>,
}

impl ServiceGroup {
    pub(crate) fn new(name: String, endpoints: Vec<Endpoint>) -> Self {
        Self {
            name,
            state: Mutex::new(GroupState { endpoints, cursor: 0 }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.lock().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// Identity of every endpoint, in registration order.
    pub fn list_endpoints(&self) -> Vec<SelectedEndpoint> {
        self.lock()
            .endpoints
            .iter()
            .map(|e| e.to_selected(&self.name))
            .collect()
    }

    /// Lock the group's state.
    ///
    /// Every mutation leaves endpoints in a valid state, so a poisoned lock
    /// is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
