use tracing::debug;

use super::{LoaderState, StateCell};
use crate::api::{ApiError, Endpoint};
use crate::cache::CachedFetch;
use crate::models::{Employee, NoParams};

/// Loads the full employee directory in one request.
#[derive(Clone)]
pub struct EmployeeLoader {
    fetch: CachedFetch,
    state: StateCell<Vec<Employee>>,
}

impl EmployeeLoader {
    pub fn new(fetch: CachedFetch) -> Self {
        Self {
            fetch,
            state: StateCell::default(),
        }
    }

    pub async fn fetch_all(&self) -> Result<(), ApiError> {
        let employees: Vec<Employee> = self
            .fetch
            .fetch_with_cache(Endpoint::Employees, &NoParams {})
            .await?;
        debug!(count = employees.len(), "Employees loaded");
        self.state.set(Some(employees));
        Ok(())
    }

    pub fn data(&self) -> Option<Vec<Employee>> {
        self.state.get()
    }

    pub fn loading(&self) -> bool {
        self.fetch.loading()
    }

    pub fn snapshot(&self) -> LoaderState<Vec<Employee>> {
        LoaderState {
            data: self.data(),
            loading: self.loading(),
        }
    }
}
