//! Endpoint registry subsystem.
//!
//! # Data Flow
//! ```text
//! EngineConfig.endpoints
//!     → provider.rs (resolve ProviderKind, defaults, credential)
//!     → pool.rs RegistryBuilder (group endpoints, reject duplicates)
//!     → EndpointRegistry (frozen structure)
//!         → group.rs ServiceGroup (endpoints + cursor behind one mutex)
//!         → endpoint.rs Endpoint (identity + health record)
//! ```
//!
//! # Design Decisions
//! - Structure is fixed at startup; only health fields mutate afterwards
//! - One lock per service group instead of one global lock
//! - Callers receive `SelectedEndpoint` copies, never the health record

pub mod endpoint;
pub mod group;
pub mod pool;
pub mod provider;

pub use endpoint::{Endpoint, EndpointSpec, SelectedEndpoint};
pub use group::ServiceGroup;
pub use pool::{EndpointRegistry, RegistryBuilder};
pub use provider::{Credential, ProviderKind};
