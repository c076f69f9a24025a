use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::{ApiSource, Endpoint, QueryParams};
use crate::error::ApiError;

type CacheKey = (Endpoint, QueryParams);

/// Append-only response cache in front of an [`ApiSource`].
///
/// Successful responses are kept for the lifetime of the wrapper (one
/// session); failures are never cached so the next identical call tries
/// the network again. There is no eviction.
pub struct Memoized<A> {
    inner: A,
    entries: Mutex<HashMap<CacheKey, Value>>,
}

impl<A: ApiSource> Memoized<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Number of distinct `(endpoint, params)` responses held.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn store(&self, key: CacheKey, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.entry(key).or_insert(value);
        }
    }
}

#[async_trait]
impl<A: ApiSource> ApiSource for Memoized<A> {
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, ApiError> {
        let key = (endpoint, params.clone());
        if let Some(hit) = self.lookup(&key) {
            debug!(endpoint = %endpoint, "Cache hit");
            return Ok(hit);
        }

        debug!(endpoint = %endpoint, "Cache miss");
        let value = self.inner.get(endpoint, params).await?;
        self.store(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ApiSource for Counting {
        async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> Result<Value, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::HttpStatus(500));
            }
            Ok(json!({ "endpoint": endpoint.path(), "level": params.get("level") }))
        }
    }

    fn counting(fail: bool) -> Memoized<Counting> {
        Memoized::new(Counting {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_identical_requests_hit_cache() {
        let api = counting(false);
        let params = QueryParams::new().with("level", "Country");

        let first = api.get(Endpoint::Summary, &params).await.unwrap();
        let second = api.get(Endpoint::Summary, &params).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_params_and_endpoints_are_separate_entries() {
        let api = counting(false);
        let country = QueryParams::new().with("level", "Country");
        let region = QueryParams::new().with("level", "Region");

        api.get(Endpoint::Summary, &country).await.unwrap();
        api.get(Endpoint::Summary, &region).await.unwrap();
        api.get(Endpoint::Cases, &country).await.unwrap();

        assert_eq!(api.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(api.len(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let api = counting(true);
        let params = QueryParams::new();

        assert!(api.get(Endpoint::Metadata, &params).await.is_err());
        assert!(api.get(Endpoint::Metadata, &params).await.is_err());

        assert_eq!(api.inner().calls.load(Ordering::SeqCst), 2);
        assert!(api.is_empty());
    }
}
