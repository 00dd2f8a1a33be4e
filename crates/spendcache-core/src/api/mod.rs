//! Data sources the response cache fetches through.
//!
//! Every source answers the same four named endpoints with JSON:
//!
//! - `MockApi`: in-memory store seeded from a JSON fixture, with simulated latency
//! - `ApiClient`: HTTP client that POSTs request params to `{base_url}/{endpoint}`
//!
//! Both implement the `DataSource` trait so loaders never know which one
//! they are talking to.

pub mod client;
pub mod error;
pub mod mock;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use mock::MockApi;
pub use source::{DataSource, Endpoint};
