//! Calling a capability with automatic cross-provider fallback.

use thiserror::Error;
use tokio::time::Instant;

use crate::adapter::{AdapterSet, ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse};
use crate::engine::RotationEngine;
use crate::error::RotationError;
use crate::health::availability::deadline_after;
use crate::registry::endpoint::SelectedEndpoint;

/// A successful call and the endpoint that served it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub endpoint: SelectedEndpoint,
    pub response: ProviderResponse,
    /// Adapter calls made, including the successful one.
    pub attempts: usize,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    /// Nothing could be selected before any provider was called.
    #[error(transparent)]
    Rotation(#[from] RotationError),

    /// Providers were called and the chain ran out.
    #[error("all providers for '{category}' failed after {attempts} attempt(s), last error: {last_error}")]
    Exhausted {
        category: String,
        attempts: usize,
        last_error: ProviderError,
    },
}

/// Call the best provider for `category`, falling back tier by tier.
///
/// Every failure is reported to the engine before the next tier is tried,
/// so concurrent callers stop picking the failed endpoint too.
pub async fn call_with_fallback(
    engine: &RotationEngine,
    adapters: &AdapterSet,
    category: &str,
    request: &ProviderRequest,
) -> Result<Invocation, InvokeError> {
    let tiers = engine.chains().get(category)?.len();
    let mut attempts = 0;
    let mut last_error: Option<ProviderError> = None;
    let mut next = engine.resolve_with_primary(category);

    // Each round resumes after the previous group's tier, so the chain
    // length bounds the loop.
    for _ in 0..tiers {
        let endpoint = match next {
            Ok(endpoint) => endpoint,
            Err(e) => return Err(give_up(category, attempts, last_error, e)),
        };

        let Some(adapter) = adapters.get(endpoint.kind) else {
            tracing::debug!(
                category,
                group = %endpoint.group,
                kind = %endpoint.kind,
                "No adapter for provider kind, skipping group"
            );
            next = engine.resolve(category, Some(&endpoint.group));
            continue;
        };

        attempts += 1;
        match adapter.call(&endpoint, request).await {
            Ok(response) => {
                tracing::debug!(category, group = %endpoint.group, endpoint = %endpoint.name, attempts, "Provider call succeeded");
                return Ok(Invocation {
                    endpoint,
                    response,
                    attempts,
                });
            }
            Err(err) => {
                match &err {
                    ProviderError::RateLimited { retry_after } => {
                        let reset_at = retry_after.map(|d| deadline_after(Instant::now(), d));
                        engine.mark_rate_limited(&endpoint.group, &endpoint.name, reset_at);
                    }
                    ProviderError::Failed(message) => {
                        engine.mark_error(&endpoint.group, &endpoint.name, message);
                    }
                }
                last_error = Some(err);
                next = engine.resolve(category, Some(&endpoint.group));
            }
        }
    }

    let exhausted = RotationError::Unavailable {
        target: category.to_string(),
    };
    Err(give_up(category, attempts, last_error, exhausted))
}

fn give_up(category: &str, attempts: usize, last_error: Option<ProviderError>, cause: RotationError) -> InvokeError {
    match last_error {
        Some(last_error) => {
            tracing::warn!(category, attempts, error = %last_error, "Every provider in the chain failed");
            InvokeError::Exhausted {
                category: category.to_string(),
                attempts,
                last_error,
            }
        }
        None => InvokeError::Rotation(cause),
    }
}
