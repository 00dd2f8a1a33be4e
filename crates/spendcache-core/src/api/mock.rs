//! In-memory mock endpoint.
//!
//! Serves employees and transactions from a JSON fixture and keeps approval
//! writes in memory for the life of the process. Each request sleeps for a
//! configurable latency plus random jitter so loading states are visible.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, DataSource, Endpoint};
use crate::models::{
    Employee, EmployeeParams, PaginatedRequestParams, PaginatedResponse,
    SetTransactionApprovalParams, Transaction,
};

/// Fixture compiled into the binary, used when no fixture path is configured.
const EMBEDDED_FIXTURE: &str = include_str!("../../data/mock_data.json");

/// Rows served per page of `paginatedTransactions`.
pub const TRANSACTIONS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockData {
    pub employees: Vec<Employee>,
    pub transactions: Vec<Transaction>,
}

pub struct MockApi {
    data: Mutex<MockData>,
    latency: Duration,
}

impl MockApi {
    pub fn new(data: MockData) -> Self {
        Self {
            data: Mutex::new(data),
            latency: Duration::ZERO,
        }
    }

    /// Mock seeded from the fixture compiled into the crate.
    pub fn embedded() -> Result<Self, ApiError> {
        Self::from_fixture_str(EMBEDDED_FIXTURE)
    }

    pub fn from_fixture_str(json: &str) -> Result<Self, ApiError> {
        let data: MockData = serde_json::from_str(json)?;
        Ok(Self::new(data))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mock fixture: {}", path.display()))?;
        Self::from_fixture_str(&contents)
            .with_context(|| format!("Failed to parse mock fixture: {}", path.display()))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockData>, ApiError> {
        self.data
            .lock()
            .map_err(|_| ApiError::ServerError("mock data store is poisoned".to_string()))
    }

    async fn simulate_latency(&self) {
        if self.latency.is_zero() {
            return;
        }
        let base = self.latency.as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        tokio::time::sleep(Duration::from_millis(base + jitter)).await;
    }

    fn employees(&self) -> Result<Vec<Employee>, ApiError> {
        Ok(self.lock()?.employees.clone())
    }

    fn transactions_paginated(
        &self,
        params: PaginatedRequestParams,
    ) -> Result<PaginatedResponse<Vec<Transaction>>, ApiError> {
        let page = params
            .page
            .ok_or_else(|| ApiError::InvalidRequest("Page cannot be null".to_string()))?
            as usize;

        let data = self.lock()?;
        let total = data.transactions.len();
        let start = page * TRANSACTIONS_PER_PAGE;
        if start > total {
            return Err(ApiError::InvalidRequest(format!("Invalid page {}", page)));
        }
        let end = (start + TRANSACTIONS_PER_PAGE).min(total);
        let next_page = if end < total { Some(page as u32 + 1) } else { None };

        Ok(PaginatedResponse {
            data: data.transactions[start..end].to_vec(),
            next_page,
        })
    }

    fn transactions_by_employee(&self, params: EmployeeParams) -> Result<Vec<Transaction>, ApiError> {
        if params.employee_id.is_empty() {
            return Err(ApiError::InvalidRequest("Employee id cannot be empty".to_string()));
        }
        let data = self.lock()?;
        Ok(data
            .transactions
            .iter()
            .filter(|tx| tx.employee.id == params.employee_id)
            .cloned()
            .collect())
    }

    fn set_transaction_approval(&self, params: SetTransactionApprovalParams) -> Result<(), ApiError> {
        let mut data = self.lock()?;
        let tx = data
            .transactions
            .iter_mut()
            .find(|tx| tx.id == params.transaction_id)
            .ok_or_else(|| ApiError::InvalidRequest("Invalid transaction to approve".to_string()))?;
        tx.approved = params.value;
        Ok(())
    }
}

fn parse_params<P: DeserializeOwned>(endpoint: Endpoint, params: Value) -> Result<P, ApiError> {
    serde_json::from_value(params)
        .map_err(|e| ApiError::InvalidRequest(format!("Bad params for {}: {}", endpoint, e)))
}

#[async_trait]
impl DataSource for MockApi {
    async fn request(&self, endpoint: Endpoint, params: Value) -> Result<Value, ApiError> {
        self.simulate_latency().await;
        debug!(%endpoint, %params, "Mock request");

        let response = match endpoint {
            Endpoint::Employees => serde_json::to_value(self.employees()?)?,
            Endpoint::PaginatedTransactions => {
                let params = parse_params(endpoint, params)?;
                serde_json::to_value(self.transactions_paginated(params)?)?
            }
            Endpoint::TransactionsByEmployee => {
                let params = parse_params(endpoint, params)?;
                serde_json::to_value(self.transactions_by_employee(params)?)?
            }
            Endpoint::SetTransactionApproval => {
                let params = parse_params(endpoint, params)?;
                self.set_transaction_approval(params)?;
                Value::Null
            }
        };
        Ok(response)
    }
}
