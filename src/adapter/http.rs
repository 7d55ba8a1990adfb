//! Generic JSON-over-HTTP adapter.
//!
//! POSTs the request body to the endpoint's base address (plus an optional
//! path) with the credential as a Bearer token, and classifies the reply:
//! - 429 → `RateLimited`, honouring a numeric `Retry-After` (capped at a day)
//! - other non-2xx, transport errors, non-JSON bodies → `Failed`

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::adapter::{ProviderAdapter, ProviderError, ProviderRequest, ProviderResponse};
use crate::registry::endpoint::SelectedEndpoint;

#[derive(Debug, Clone)]
pub struct HttpAdapter {
    client: reqwest::Client,
    path: Option<String>,
}

impl HttpAdapter {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, path: None })
    }

    /// Append `path` (e.g. `chat/completions`) to every endpoint's base address.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn target(&self, base: &Url) -> Result<Url, ProviderError> {
        let Some(path) = &self.path else {
            return Ok(base.clone());
        };
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Failed(format!("base URL '{}' cannot take a path", base)))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn send(&self, endpoint: &SelectedEndpoint, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = self.target(&endpoint.base_url)?;
        let res = self
            .client
            .post(url)
            .bearer_auth(endpoint.credential.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Failed(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after: retry_after(res.headers()),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Failed(format!("HTTP {}", status)));
        }

        res.json::<ProviderResponse>()
            .await
            .map_err(|e| ProviderError::Failed(format!("invalid response body: {}", e)))
    }
}

impl ProviderAdapter for HttpAdapter {
    fn call<'a>(
        &'a self,
        endpoint: &'a SelectedEndpoint,
        request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderResponse, ProviderError>> {
        self.send(endpoint, request).boxed()
    }
}

/// Longest `Retry-After` taken at face value.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
