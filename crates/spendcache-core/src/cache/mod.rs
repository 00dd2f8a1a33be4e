//! Response caching shared by every loader.
//!
//! `ResponseCache` is an explicitly constructed, in-memory keyed store of the
//! last successful response per `(endpoint, params)` pair. It lives as long
//! as the `Arc` handed to each loader; nothing is persisted.
//!
//! `CachedFetch` is a per-loader handle onto the shared cache that adds
//! get-or-fetch semantics and the loader's own loading flag.

pub mod fetch;
pub mod manager;

pub use fetch::CachedFetch;
pub use manager::{CacheStats, CachedData, ResponseCache};
