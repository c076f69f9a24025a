//! Client for the public-health statistics API.
//!
//! [`ApiSource`] is the abstraction the session pipeline talks to. The
//! production implementation is [`HttpApi`]; [`Memoized`] wraps any source
//! with a per-session response cache keyed by endpoint and query.

mod cache;
mod http;
mod requests;

pub use cache::Memoized;
pub use http::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, HttpApi, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
pub use requests::{DEFAULT_CASES_LIMIT, cases_params, fetch_cases, fetch_metadata, fetch_summary, summary_params};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ApiError;

/// The three read-only endpoints the dashboard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Metadata,
    Summary,
    Cases,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Metadata => "metadata",
            Endpoint::Summary => "summary",
            Endpoint::Cases => "cases",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Query parameters in canonical (sorted) order, so two requests with the
/// same pairs compare and hash equal regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source of raw JSON responses. One call is one attempt: implementations
/// must not retry.
#[async_trait]
pub trait ApiSource: Send + Sync {
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_are_order_independent() {
        let a = QueryParams::new().with("level", "Country").with("end", "2023-01-01");
        let b = QueryParams::new().with("end", "2023-01-01").with("level", "Country");

        assert_eq!(a, b);
        let keys: Vec<_> = a.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["end", "level"]);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::Cases.to_string(), "/cases");
        assert_eq!(Endpoint::Metadata.path(), "metadata");
    }
}
