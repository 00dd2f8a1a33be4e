use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Employee;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    #[serde(alias = "merchant")]
    pub recipient: String,
    pub employee: Employee,
    pub approved: bool,
    pub date: NaiveDate,
}

/// One page of results. `next_page == None` means there is nothing left to fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: T,
    #[serde(rename = "nextPage")]
    pub next_page: Option<u32>,
}

impl<T> PaginatedResponse<T> {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Parameters for endpoints that take none (serialized as `{}`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NoParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedRequestParams {
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeParams {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTransactionApprovalParams {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub value: bool,
}
