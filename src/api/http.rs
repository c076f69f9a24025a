use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ApiSource, Endpoint, QueryParams};
use crate::error::ApiError;
use crate::fetch::{BasicClient, HttpClient, get_json};

pub const DEFAULT_API_BASE: &str = "https://web-production-1a8ae.up.railway.app/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MIN_TIMEOUT_SECS: u64 = 3;
pub const MAX_TIMEOUT_SECS: u64 = 30;

/// [`ApiSource`] backed by real HTTP requests against `base_url`.
pub struct HttpApi<C = BasicClient> {
    client: C,
    base_url: String,
    timeout: Duration,
}

impl HttpApi<BasicClient> {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self::with_client(BasicClient::new(), base_url, timeout_secs)
    }
}

impl<C: HttpClient> HttpApi<C> {
    /// Builds a client over `client`. Trailing slashes on `base_url` are
    /// dropped and the timeout is clamped to the supported 3..=30 seconds.
    pub fn with_client(client: C, base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url_for(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, endpoint.path());
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params.iter())
        };
        url.map_err(|e| ApiError::Network(format!("invalid API URL '{raw}': {e}")))
    }
}

#[async_trait]
impl<C: HttpClient> ApiSource for HttpApi<C> {
    #[tracing::instrument(skip(self, params))]
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, ApiError> {
        let url = self.url_for(endpoint, params)?;
        debug!(url = %url, "Requesting API");
        get_json(&self.client, url, self.timeout).await
    }
}
