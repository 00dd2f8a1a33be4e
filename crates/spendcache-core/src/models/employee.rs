use serde::{Deserialize, Serialize};

/// Id carried by the "All Employees" sentinel.
pub const EMPTY_EMPLOYEE_ID: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

impl Employee {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// True for the "no filter / show all" sentinel.
    pub fn is_empty_employee(&self) -> bool {
        self.id == EMPTY_EMPLOYEE_ID
    }
}

/// The "All Employees" entry placed at the top of the employee filter.
pub fn empty_employee() -> Employee {
    Employee::new(EMPTY_EMPLOYEE_ID, "All", "Employees")
}
