//! Error types shared across the engine.

use thiserror::Error;

/// Errors returned by endpoint selection and fallback resolution.
///
/// None of these are fatal: absence of a healthy provider is an expected
/// runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// The service group has no registered endpoints (configuration issue).
    #[error("no endpoints configured for service group '{group}'")]
    NoEndpointsConfigured { group: String },

    /// Every endpoint or tier is exhausted right now; try again later.
    #[error("no endpoint available for '{target}'")]
    Unavailable { target: String },

    /// The capability category has no fallback chain.
    #[error("unknown capability category '{category}'")]
    UnknownCapabilityCategory { category: String },
}

impl RotationError {
    /// True for conditions that may clear on their own.
    pub fn is_transient(&self) -> bool {
        matches!(self, RotationError::Unavailable { .. })
    }
}

/// Errors raised while building or querying the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint '{name}' registered twice in service group '{group}'")]
    DuplicateEndpoint { group: String, name: String },

    #[error("endpoint '{name}' not found in service group '{group}'")]
    NotFound { group: String, name: String },
}

/// Result type for selection and resolution.
pub type RotationResult<T> = Result<T, RotationError>;
