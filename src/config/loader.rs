//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::EngineConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::RegistryError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load, resolve credentials, and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: EngineConfig = toml::from_str(&content)?;

    resolve_credentials(&mut config, |var| std::env::var(var).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        path = %path.display(),
        endpoints = config.endpoints.len(),
        chains = config.chains.len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Fill `credential` from `credential_env` using `lookup`.
///
/// Endpoints whose variable is unset and that carry no literal credential
/// are dropped.
pub fn resolve_credentials<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    config.endpoints.retain_mut(|endpoint| {
        let Some(var) = endpoint.credential_env.as_deref() else {
            return true;
        };
        match lookup(var).filter(|v| !v.is_empty()) {
            Some(secret) => {
                endpoint.credential = Some(secret);
                true
            }
            None if endpoint.credential.is_some() => true,
            None => {
                tracing::warn!(
                    group = %endpoint.group,
                    endpoint = %endpoint.name,
                    variable = var,
                    "Credential variable not set, skipping endpoint"
                );
                false
            }
        }
    });
}
