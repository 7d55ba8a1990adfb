//! Provider adapter seam.
//!
//! # Data Flow
//! ```text
//! call_with_fallback(category, request)
//!     → engine.resolve_with_primary
//!     → AdapterSet lookup by ProviderKind
//!     → ProviderAdapter::call (no engine lock held)
//!         ok            → response to caller
//!         RateLimited   → engine.mark_rate_limited, resolve past the group
//!         Failed        → engine.mark_error, resolve past the group
//! ```
//!
//! # Design Decisions
//! - Requests and responses are opaque JSON; the engine never inspects them
//! - Dispatch is by the kind resolved at registration, not by name matching
//! - Retrying a single call is the adapter's business, not the engine's

pub mod http;
pub mod invoke;

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::registry::endpoint::SelectedEndpoint;
use crate::registry::provider::ProviderKind;

pub use http::HttpAdapter;
pub use invoke::{call_with_fallback, InvokeError, Invocation};

pub type ProviderRequest = serde_json::Value;
pub type ProviderResponse = serde_json::Value;

/// How a provider call went wrong, as far as rotation cares.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider refused for quota reasons; `retry_after` if it said when.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider call failed: {0}")]
    Failed(String),
}

/// Performs one call against one endpoint.
pub trait ProviderAdapter: Send + Sync {
    fn call<'a>(
        &'a self,
        endpoint: &'a SelectedEndpoint,
        request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>>;
}

/// Adapters keyed by provider kind. Built once at startup.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ProviderKind, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.insert(kind, adapter);
        self
    }

    pub fn insert(&mut self, kind: ProviderKind, adapter: Arc<dyn ProviderAdapter>) {
        if self.adapters.insert(kind, adapter).is_some() {
            tracing::debug!(kind = %kind, "Replaced provider adapter");
        }
    }

    /// Use one adapter for every kind.
    pub fn uniform(adapter: Arc<dyn ProviderAdapter>) -> Self {
        let mut set = Self::new();
        for kind in ProviderKind::ALL {
            set.insert(kind, adapter.clone());
        }
        set
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.adapters.keys().collect();
        kinds.sort();
        f.debug_struct("AdapterSet").field("kinds", &kinds).finish()
    }
}
