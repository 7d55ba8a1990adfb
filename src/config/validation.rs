//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (endpoint kinds resolvable, credentials present)
//! - Validate value ranges (durations within (0, one week], addresses parse)
//! - Detect malformed chains (empty tiers, repeated groups)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs after credential resolution, before the engine is built

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::EngineConfig;
use crate::health::availability::MAX_HEALTH_DELAY;

/// One semantic problem, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let max_secs = MAX_HEALTH_DELAY.as_secs();
    for (field, secs) in [
        ("health.recovery_cooldown_secs", config.health.recovery_cooldown_secs),
        ("health.rate_limit_reset_secs", config.health.rate_limit_reset_secs),
        ("health.quota_window_secs", config.health.quota_window_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        } else if secs > max_secs {
            errors.push(ValidationError::new(field, format!("must be at most {} seconds", max_secs)));
        }
    }

    let mut seen = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        let field = format!("endpoints[{}]", i);
        if endpoint.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        }
        if endpoint.group.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.group", field), "must not be empty"));
        }
        if !seen.insert((endpoint.group.as_str(), endpoint.name.as_str())) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate endpoint '{}' in group '{}'", endpoint.name, endpoint.group),
            ));
        }
        if endpoint.resolved_kind().is_none() {
            errors.push(ValidationError::new(
                format!("{}.kind", field),
                format!("cannot infer provider kind from group '{}'; set kind explicitly", endpoint.group),
            ));
        }
        if let Some(url) = &endpoint.base_url {
            if !matches!(url.scheme(), "http" | "https") {
                errors.push(ValidationError::new(
                    format!("{}.base_url", field),
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
        }
        match &endpoint.credential {
            Some(secret) if !secret.is_empty() => {}
            _ => errors.push(ValidationError::new(format!("{}.credential", field), "missing credential")),
        }
    }

    for (category, tiers) in &config.chains {
        let field = format!("chains.{}", category);
        if tiers.is_empty() {
            errors.push(ValidationError::new(field.clone(), "chain has no tiers"));
        }
        let mut groups = HashSet::new();
        for (t, tier) in tiers.iter().enumerate() {
            if tier.is_empty() {
                errors.push(ValidationError::new(format!("{}[{}]", field, t), "tier is empty"));
            }
            for group in tier {
                if !groups.insert(group.as_str()) {
                    errors.push(ValidationError::new(
                        format!("{}[{}]", field, t),
                        format!("group '{}' appears more than once", group),
                    ));
                }
            }
        }
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }
    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty when admin is enabled"));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new("admin.bind_address", "not a socket address"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
