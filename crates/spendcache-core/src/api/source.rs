use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// The named endpoints every data source answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Employees,
    PaginatedTransactions,
    TransactionsByEmployee,
    SetTransactionApproval,
}

impl Endpoint {
    /// Wire name, also the prefix of every cache key for this endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Employees => "employees",
            Endpoint::PaginatedTransactions => "paginatedTransactions",
            Endpoint::TransactionsByEmployee => "transactionsByEmployee",
            Endpoint::SetTransactionApproval => "setTransactionApproval",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can answer an endpoint request with JSON.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn request(&self, endpoint: Endpoint, params: Value) -> Result<Value, ApiError>;
}
