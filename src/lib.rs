//! Provider rotation engine.
//!
//! Picks which credentialed endpoint of which provider should serve a call,
//! steers around endpoints that are rate limited, failing or switched off,
//! and brings failed endpoints back after a cooldown.

pub mod adapter;
pub mod admin;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod rotation;

pub use adapter::{call_with_fallback, AdapterSet, ProviderAdapter, ProviderError};
pub use config::schema::EngineConfig;
pub use engine::RotationEngine;
pub use error::{RegistryError, RotationError, RotationResult};
pub use health::{EndpointStatus, HealthPolicy, RecoveryScheduler};
pub use lifecycle::Shutdown;
pub use observability::StatusReport;
pub use registry::{EndpointRegistry, EndpointSpec, ProviderKind, SelectedEndpoint};
