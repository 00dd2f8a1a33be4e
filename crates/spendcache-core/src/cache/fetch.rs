use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ResponseCache;
use crate::api::{ApiError, DataSource, Endpoint};

/// A loader's handle onto the shared response cache and data source.
///
/// Clones share the same loading counter; separate handles created with
/// `new` share only the cache and source.
#[derive(Clone)]
pub struct CachedFetch {
    cache: Arc<ResponseCache>,
    source: Arc<dyn DataSource>,
    in_flight: Arc<AtomicUsize>,
}

/// Holds one slot of the in-flight counter until dropped, so the loading
/// flag is released on success, on error and when the future is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CachedFetch {
    pub fn new(cache: Arc<ResponseCache>, source: Arc<dyn DataSource>) -> Self {
        Self {
            cache,
            source,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while any request made through this handle is in flight.
    pub fn loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Return the cached response for `(endpoint, params)`, or fetch it and
    /// cache it on success. Errors are returned and never cached, and neither
    /// is a response whose request overlapped a cache clear.
    pub async fn fetch_with_cache<T, P>(&self, endpoint: Endpoint, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let key = ResponseCache::cache_key(endpoint, params)?;

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return decode(endpoint, cached);
        }

        debug!(key = %key, "Cache miss");
        let generation = self.cache.generation();
        let value = self.wrapped_request(endpoint, serde_json::to_value(params)?).await?;
        let decoded = decode(endpoint, value.clone())?;
        self.cache.insert(key, value, generation);
        Ok(decoded)
    }

    /// Always hit the data source and never touch the cache. Used for writes.
    pub async fn fetch_without_cache<T, P>(&self, endpoint: Endpoint, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let value = self.wrapped_request(endpoint, serde_json::to_value(params)?).await?;
        decode(endpoint, value)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_cache_by_endpoint(&self, endpoints: &[Endpoint]) -> usize {
        self.cache.clear_endpoints(endpoints)
    }

    async fn wrapped_request(&self, endpoint: Endpoint, params: Value) -> Result<Value, ApiError> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        self.source.request(endpoint, params).await.map_err(|e| {
            warn!(%endpoint, error = %e, "Request failed");
            e
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("Unexpected {} response: {}", endpoint, e)))
}
