//! spendcache core: data sources, the shared response cache, the three
//! transaction/employee loaders and the view controller that reconciles them.
//!
//! The TUI crate only renders `TransactionsView::snapshot()` and forwards
//! user actions to the controller.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod loaders;
pub mod models;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, DataSource, Endpoint, MockApi};
pub use cache::{CacheStats, CachedFetch, ResponseCache};
pub use config::{Config, SourceKind};
pub use controller::{EmployeeFilter, FilterRoute, TransactionsView, ViewMode, ViewMore, ViewSnapshot};
pub use models::{empty_employee, Employee, PaginatedResponse, Transaction};
