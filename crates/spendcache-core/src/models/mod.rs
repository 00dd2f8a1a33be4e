//! Data models for transaction review.
//!
//! - `Employee` and the `EMPTY_EMPLOYEE` "show all" sentinel
//! - `Transaction`: a single card transaction with its approval flag
//! - `PaginatedResponse`: one page of results plus the next-page cursor
//! - Request parameter types sent to the data source

pub mod employee;
pub mod transaction;

pub use employee::{empty_employee, Employee, EMPTY_EMPLOYEE_ID};
pub use transaction::{
    EmployeeParams, NoParams, PaginatedRequestParams, PaginatedResponse,
    SetTransactionApprovalParams, Transaction,
};
