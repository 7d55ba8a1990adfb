//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (resolve credential_env from the environment)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → RotationEngine::from_config
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the registry never changes shape
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AdminConfig, EndpointConfig, EngineConfig, HealthConfig, ObservabilityConfig};
pub use validation::ValidationError;
