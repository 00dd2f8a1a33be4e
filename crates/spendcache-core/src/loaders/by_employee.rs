use tracing::debug;

use super::{LoaderState, SharedLists, TransactionLists};
use crate::api::{ApiError, Endpoint};
use crate::cache::CachedFetch;
use crate::models::{EmployeeParams, Transaction};

/// Loads every transaction of one employee in a single response.
#[derive(Clone)]
pub struct TransactionsByEmployeeLoader {
    fetch: CachedFetch,
    lists: SharedLists,
}

impl TransactionsByEmployeeLoader {
    pub fn new(fetch: CachedFetch) -> Self {
        Self::with_lists(fetch, SharedLists::default())
    }

    pub(crate) fn with_lists(fetch: CachedFetch, lists: SharedLists) -> Self {
        Self { fetch, lists }
    }

    /// Replace the state with `employee_id`'s transactions. No merge: the
    /// employee scope changed.
    pub async fn fetch_by_id(&self, employee_id: &str) -> Result<(), ApiError> {
        self.fetch_by_id_then(employee_id, |_| {}).await
    }

    /// `fetch_by_id`, then `then` runs under the same write lock as the store.
    pub(crate) async fn fetch_by_id_then(
        &self,
        employee_id: &str,
        then: impl FnOnce(&mut TransactionLists),
    ) -> Result<(), ApiError> {
        if employee_id.is_empty() {
            return Err(ApiError::InvalidRequest("Employee id cannot be empty".to_string()));
        }

        let params = EmployeeParams {
            employee_id: employee_id.to_string(),
        };
        let transactions: Vec<Transaction> = self
            .fetch
            .fetch_with_cache(Endpoint::TransactionsByEmployee, &params)
            .await?;
        debug!(employee_id, rows = transactions.len(), "Employee transactions loaded");

        let mut lists = self.lists.write();
        lists.filtered = Some(transactions);
        then(&mut *lists);
        Ok(())
    }

    pub fn invalidate_data(&self) {
        self.lists.write().filtered = None;
    }

    pub fn data(&self) -> Option<Vec<Transaction>> {
        self.lists.read().filtered.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.read().filtered.is_none()
    }

    pub fn loading(&self) -> bool {
        self.fetch.loading()
    }

    pub fn snapshot(&self) -> LoaderState<Vec<Transaction>> {
        LoaderState {
            data: self.data(),
            loading: self.loading(),
        }
    }
}
