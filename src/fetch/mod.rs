//! HTTP transport for the statistics API.
//!
//! [`HttpClient`] is the seam every outbound request goes through, so tests
//! and wrappers can swap the underlying `reqwest` client. [`get_json`] issues
//! exactly one attempt and classifies failures into [`ApiError`].

mod basic;

pub use basic::BasicClient;

use async_trait::async_trait;
use reqwest::{Method, Request, Response, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Sends a GET to `url` bounded by `timeout` and decodes the body as JSON.
///
/// Non-2xx statuses fail with [`ApiError::HttpStatus`]; the timeout covers
/// the whole exchange, body included.
pub async fn get_json<C: HttpClient + ?Sized>(
    client: &C,
    url: Url,
    timeout: Duration,
) -> Result<Value, ApiError> {
    let mut req = Request::new(Method::GET, url);
    *req.timeout_mut() = Some(timeout);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| classify(e, timeout))?;

    let status = resp.status();
    debug!(status = status.as_u16(), "API response received");
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()));
    }

    let body = resp.bytes().await.map_err(|e| classify(e, timeout))?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn classify(err: reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout.as_secs())
    } else if let Some(status) = err.status() {
        ApiError::HttpStatus(status.as_u16())
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}
