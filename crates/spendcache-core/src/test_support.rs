//! Scripted data source and fixtures shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::api::{ApiError, DataSource, Endpoint};
use crate::models::{Employee, Transaction};

type Handler = Box<dyn Fn(Endpoint, &Value) -> Result<Value, ApiError> + Send + Sync>;

/// Answers requests from a closure and records every call.
///
/// A gated source parks each request until the test adds a permit, which
/// lets tests observe state while a fetch is in flight.
pub struct ScriptedSource {
    handler: Handler,
    calls: Mutex<Vec<(Endpoint, Value)>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Endpoint, &Value) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated<F>(handler: F) -> (Self, Arc<Semaphore>)
    where
        F: Fn(Endpoint, &Value) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        let gate = Arc::new(Semaphore::new(0));
        let mut source = Self::new(handler);
        source.gate = Some(gate.clone());
        (source, gate)
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn request(&self, endpoint: Endpoint, params: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push((endpoint, params.clone()));
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        (self.handler)(endpoint, &params)
    }
}

/// Yield to spawned tasks until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn ann_lee() -> Employee {
    Employee::new("e1", "Ann", "Lee")
}

pub fn tx(id: &str, employee: &Employee) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount: 10.0,
        recipient: format!("Merchant {}", id),
        employee: employee.clone(),
        approved: false,
        date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
    }
}

/// Directory [Ann Lee]; page 0 = [tx_a] -> 1; page 1 = [tx_b] -> null;
/// e1 has [tx_c]. Any other request fails.
pub fn scenario_handler(endpoint: Endpoint, params: &Value) -> Result<Value, ApiError> {
    let ann = ann_lee();
    match endpoint {
        Endpoint::Employees => Ok(json!([ann])),
        Endpoint::PaginatedTransactions => match params["page"].as_u64() {
            Some(0) => Ok(json!({"data": [tx("tx_a", &ann)], "nextPage": 1})),
            Some(1) => Ok(json!({"data": [tx("tx_b", &ann)], "nextPage": null})),
            _ => Err(ApiError::InvalidRequest(format!("Invalid page {}", params["page"]))),
        },
        Endpoint::TransactionsByEmployee if params["employeeId"] == json!("e1") => {
            Ok(json!([tx("tx_c", &ann)]))
        }
        Endpoint::TransactionsByEmployee => Ok(json!([])),
        Endpoint::SetTransactionApproval => Ok(Value::Null),
    }
}

pub fn ids(transactions: &[Transaction]) -> Vec<&str> {
    transactions.iter().map(|tx| tx.id.as_str()).collect()
}
