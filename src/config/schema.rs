//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::registry::endpoint::EndpointSpec;
use crate::registry::provider::{Credential, ProviderKind};

/// Root configuration for the rotation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Health policy thresholds and timings.
    pub health: HealthConfig,

    /// Endpoint definitions, grouped by their `group` field.
    pub endpoints: Vec<EndpointConfig>,

    /// Capability category → ordered tiers of service group names.
    pub chains: BTreeMap<String, Vec<Vec<String>>>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health: HealthConfig::default(),
            endpoints: Vec::new(),
            chains: default_chains(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Health policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Error endpoints with more errors than this are quarantined.
    pub quarantine_threshold: u32,

    /// Delay before a failed endpoint is reinstated, in seconds.
    pub recovery_cooldown_secs: u64,

    /// Rate-limit duration when the provider gives no reset time, in seconds.
    pub rate_limit_reset_secs: u64,

    /// Request-quota window length in seconds.
    pub quota_window_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            quarantine_threshold: 5,
            recovery_cooldown_secs: 60,
            rate_limit_reset_secs: 60,
            quota_window_secs: 60,
        }
    }
}

/// One credentialed endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Identifier, unique within its group.
    pub name: String,

    /// Service group this endpoint belongs to.
    pub group: String,

    /// Vendor; inferred from the group name when omitted.
    #[serde(default)]
    pub kind: Option<ProviderKind>,

    /// Base address; the kind's default when omitted.
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Literal credential. Prefer `credential_env`.
    #[serde(default)]
    pub credential: Option<String>,

    /// Environment variable holding the credential.
    #[serde(default)]
    pub credential_env: Option<String>,

    /// Requests per quota window; the kind's default when omitted, 0 for unlimited.
    #[serde(default)]
    pub max_requests_per_window: Option<u32>,
}

impl EndpointConfig {
    pub fn resolved_kind(&self) -> Option<ProviderKind> {
        self.kind.or_else(|| ProviderKind::infer_from_group(&self.group))
    }

    /// Registration data, or `None` when kind or credential is missing.
    pub fn to_spec(&self) -> Option<EndpointSpec> {
        let kind = self.resolved_kind()?;
        let credential = Credential::new(self.credential.clone()?);
        let mut spec = EndpointSpec::with_defaults(self.name.clone(), kind, credential);
        if let Some(url) = &self.base_url {
            spec.base_url = url.clone();
        }
        if let Some(limit) = self.max_requests_per_window {
            spec.max_requests_per_window = limit;
        }
        Some(spec)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Built-in chains used when the config file declares none.
pub fn default_chains() -> BTreeMap<String, Vec<Vec<String>>> {
    fn tiers(groups: &[&str]) -> Vec<Vec<String>> {
        groups.iter().map(|g| vec![g.to_string()]).collect()
    }

    let ai = ["qwen", "gemini", "openai", "groq", "deepseek"];
    let mut chains = BTreeMap::new();
    chains.insert("ai_models".to_string(), tiers(&ai));
    chains.insert("ai_generation".to_string(), tiers(&ai));
    chains.insert(
        "search".to_string(),
        tiers(&["jina", "exa", "serper", "serpapi", "firecrawl", "tavily", "apify"]),
    );
    chains.insert(
        "social_insights".to_string(),
        tiers(&["supadata", "apify", "serper", "serpapi", "firecrawl", "tavily"]),
    );
    chains.insert(
        "web_scraping".to_string(),
        tiers(&["firecrawl", "apify", "scrapingant", "jina", "serper", "serpapi"]),
    );
    chains.insert(
        "content_extraction".to_string(),
        tiers(&["firecrawl", "jina", "apify", "scrapingant", "serper", "rapidapi"]),
    );
    chains.insert(
        "url_analysis".to_string(),
        tiers(&["firecrawl", "jina", "exa", "apify", "serper", "serpapi"]),
    );
    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.health.quarantine_threshold, 5);
        assert_eq!(config.health.recovery_cooldown_secs, 60);
        assert!(config.endpoints.is_empty());
        assert_eq!(config.chains.len(), 7);
        assert_eq!(config.chains["search"][0], vec!["jina".to_string()]);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_explicit_chains_replace_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [chains]
            search = [["jina"], ["exa", "serper"]]
            "#,
        )
        .unwrap();
        assert_eq!(config.chains.len(), 1);
        assert_eq!(config.chains["search"][1], vec!["exa".to_string(), "serper".to_string()]);
    }

    #[test]
    fn test_endpoint_kind_inference() {
        let config: EngineConfig = toml::from_str(
            r#"
            [[endpoints]]
            name = "qwen_1"
            group = "qwen"
            credential = "sk-1"

            [[endpoints]]
            name = "custom"
            group = "llm"
            kind = "groq"
            credential = "sk-2"
            base_url = "https://groq.internal/v1"
            max_requests_per_window = 5
            "#,
        )
        .unwrap();

        let qwen = config.endpoints[0].to_spec().unwrap();
        assert_eq!(qwen.kind, ProviderKind::OpenRouter);
        assert_eq!(qwen.max_requests_per_window, 100);

        let custom = config.endpoints[1].to_spec().unwrap();
        assert_eq!(custom.kind, ProviderKind::Groq);
        assert_eq!(custom.base_url.as_str(), "https://groq.internal/v1");
        assert_eq!(custom.max_requests_per_window, 5);
    }

    #[test]
    fn test_to_spec_needs_credential() {
        let endpoint = EndpointConfig {
            name: "jina_1".into(),
            group: "jina".into(),
            kind: None,
            base_url: None,
            credential: None,
            credential_env: Some("JINA_KEY".into()),
            max_requests_per_window: None,
        };
        assert!(endpoint.to_spec().is_none());
    }
}
