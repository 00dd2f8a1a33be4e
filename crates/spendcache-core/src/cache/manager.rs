use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiError, Endpoint};

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Summary shown in the status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub last_updated: Option<String>,
}

impl CacheStats {
    pub fn last_updated(&self) -> String {
        self.last_updated.clone().unwrap_or_else(|| "never".to_string())
    }
}

/// Last successful response per `"{endpoint}@{json params}"` key.
///
/// Every clear bumps a generation counter. A response is only stored if no
/// clear happened since its request started, so a fetch that was in flight
/// across a clear cannot put pre-clear data back.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CachedData<Value>>>,
    generation: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the key for a request. Params serialize in field declaration
    /// order, so equal params always produce equal keys.
    pub fn cache_key<P: Serialize>(endpoint: Endpoint, params: &P) -> Result<String, ApiError> {
        Ok(format!("{}@{}", endpoint.as_str(), serde_json::to_string(params)?))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedData<Value>>> {
        // Entries are plain values; a panic elsewhere cannot leave one half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries().get(key).map(|cached| cached.data.clone())
    }

    /// Current generation. Read it before starting the request whose
    /// response will be passed to `insert`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` unless the cache was cleared after `generation` was read.
    /// Returns whether it was stored.
    pub fn insert(&self, key: String, value: Value, generation: u64) -> bool {
        let mut entries = self.entries();
        if self.generation() != generation {
            debug!(key = %key, "Cache cleared during request, response not cached");
            return false;
        }
        debug!(key = %key, "Caching response");
        entries.insert(key, CachedData::new(value));
        true
    }

    pub fn clear(&self) {
        let mut entries = self.entries();
        debug!(count = entries.len(), "Clearing response cache");
        entries.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop every entry belonging to one of `endpoints`. Returns how many were removed.
    pub fn clear_endpoints(&self, endpoints: &[Endpoint]) -> usize {
        let prefixes: Vec<String> = endpoints
            .iter()
            .map(|endpoint| format!("{}@", endpoint.as_str()))
            .collect();

        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !prefixes.iter().any(|prefix| key.starts_with(prefix)));
        let removed = before - entries.len();
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!(?endpoints, removed, "Cleared cache entries by endpoint");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries();
        CacheStats {
            entries: entries.len(),
            last_updated: entries
                .values()
                .max_by_key(|cached| cached.cached_at)
                .map(|cached| cached.age_display()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
