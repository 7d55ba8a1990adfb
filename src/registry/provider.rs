//! Provider kinds and credentials.
//!
//! The kind tag is resolved once, when an endpoint is registered, so adapter
//! dispatch later is a typed lookup instead of name matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The vendor behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    Gemini,
    OpenAi,
    Groq,
    DeepSeek,
    Jina,
    Exa,
    Serper,
    SerpApi,
    Tavily,
    Supadata,
    Firecrawl,
    ScrapingAnt,
    YouTube,
    RapidApi,
    Apify,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 16] = [
        ProviderKind::OpenRouter,
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
        ProviderKind::Groq,
        ProviderKind::DeepSeek,
        ProviderKind::Jina,
        ProviderKind::Exa,
        ProviderKind::Serper,
        ProviderKind::SerpApi,
        ProviderKind::Tavily,
        ProviderKind::Supadata,
        ProviderKind::Firecrawl,
        ProviderKind::ScrapingAnt,
        ProviderKind::YouTube,
        ProviderKind::RapidApi,
        ProviderKind::Apify,
    ];

    /// Lowercase identifier used in config files and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Jina => "jina",
            ProviderKind::Exa => "exa",
            ProviderKind::Serper => "serper",
            ProviderKind::SerpApi => "serpapi",
            ProviderKind::Tavily => "tavily",
            ProviderKind::Supadata => "supadata",
            ProviderKind::Firecrawl => "firecrawl",
            ProviderKind::ScrapingAnt => "scrapingant",
            ProviderKind::YouTube => "youtube",
            ProviderKind::RapidApi => "rapidapi",
            ProviderKind::Apify => "apify",
        }
    }

    /// Base address used when the config does not give one.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
            ProviderKind::Jina => "https://r.jina.ai",
            ProviderKind::Exa => "https://api.exa.ai",
            ProviderKind::Serper => "https://google.serper.dev",
            ProviderKind::SerpApi => "https://serpapi.com",
            ProviderKind::Tavily => "https://api.tavily.com",
            ProviderKind::Supadata => "https://api.supadata.ai/v1",
            ProviderKind::Firecrawl => "https://api.firecrawl.dev",
            ProviderKind::ScrapingAnt => "https://api.scrapingant.com",
            ProviderKind::YouTube => "https://www.googleapis.com/youtube/v3",
            ProviderKind::RapidApi => "https://rapidapi.com",
            ProviderKind::Apify => "https://api.apify.com/v2",
        }
    }

    /// Requests per minute allowed when the config does not give a ceiling.
    pub fn default_quota(&self) -> u32 {
        match self {
            ProviderKind::OpenRouter => 100,
            ProviderKind::Gemini => 60,
            ProviderKind::OpenAi => 60,
            ProviderKind::Groq => 30,
            ProviderKind::DeepSeek => 60,
            ProviderKind::Jina => 200,
            ProviderKind::Exa => 100,
            ProviderKind::Serper => 100,
            ProviderKind::SerpApi => 100,
            ProviderKind::Tavily => 100,
            ProviderKind::Supadata => 50,
            ProviderKind::Firecrawl => 60,
            ProviderKind::ScrapingAnt => 60,
            ProviderKind::YouTube => 100,
            ProviderKind::RapidApi => 200,
            ProviderKind::Apify => 100,
        }
    }

    /// Infer the kind from a service group name.
    ///
    /// The `qwen` group is served through OpenRouter keys; every other group
    /// is named after its vendor.
    pub fn infer_from_group(group: &str) -> Option<Self> {
        if group.eq_ignore_ascii_case("qwen") {
            return Some(ProviderKind::OpenRouter);
        }
        group.parse().ok()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownProviderKind(s.to_string()))
    }
}

/// Returned when a string names no known provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider kind '{0}'")]
pub struct UnknownProviderKind(pub String);

/// An API credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for adapters building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if self.0.chars().count() > 8 {
            write!(f, "Credential(***{})", tail)
        } else {
            f.write_str("Credential(***)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("SerpApi".parse::<ProviderKind>().unwrap(), ProviderKind::SerpApi);
        assert!("carrier-pigeon".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_infer_from_group() {
        assert_eq!(ProviderKind::infer_from_group("qwen"), Some(ProviderKind::OpenRouter));
        assert_eq!(ProviderKind::infer_from_group("jina"), Some(ProviderKind::Jina));
        assert_eq!(ProviderKind::infer_from_group("custom-llm"), None);
    }

    #[test]
    fn test_default_base_urls_parse() {
        for kind in ProviderKind::ALL {
            assert!(url::Url::parse(kind.default_base_url()).is_ok(), "{}", kind.as_str());
        }
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ProviderKind::ScrapingAnt).unwrap();
        assert_eq!(json, "\"scrapingant\"");
        for kind in ProviderKind::ALL {
            let encoded = serde_json::to_string(&kind).unwrap();
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_credential_redacted() {
        let cred = Credential::new("sk-1234567890abcd");
        let printed = format!("{:?}", cred);
        assert!(!printed.contains("1234567890"));
        assert!(printed.ends_with("abcd)"));
        assert_eq!(format!("{:?}", Credential::new("short")), "Credential(***)");
    }
}
