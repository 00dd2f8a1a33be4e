//! Stateful loaders over the shared response cache.
//!
//! Each loader owns a `CachedFetch` handle (its own loading flag, the shared
//! cache) and shared state. `None` means "never loaded or invalidated".
//!
//! The paginated and filtered loaders keep their lists in one
//! `SharedLists` cell, so a load and the invalidation of the other list
//! land in a single write and readers never see both lists empty in
//! between. Cells are only locked for plain reads and writes, never across
//! an await.

pub mod by_employee;
pub mod employees;
pub mod paginated;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use by_employee::TransactionsByEmployeeLoader;
pub use employees::EmployeeLoader;
pub use paginated::{PaginatedTransactionsLoader, TransactionPage};

use crate::models::Transaction;

/// Point-in-time copy of a loader's state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderState<T> {
    pub data: Option<T>,
    pub loading: bool,
}

/// Shared `Option<T>` cell behind a standalone loader.
#[derive(Debug)]
pub(crate) struct StateCell<T>(Arc<RwLock<Option<T>>>);

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(None)))
    }
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn get(&self) -> Option<T> {
        // State is replaced wholesale, so a poisoned lock still holds a complete value
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub(crate) fn set(&self, value: Option<T>) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

/// Both transaction lists. At most one is normally loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLists {
    /// Paginated all-transactions list
    pub all: Option<TransactionPage>,
    /// One employee's transactions
    pub filtered: Option<Vec<Transaction>>,
}

impl TransactionLists {
    /// Apply `f` to every row of both lists.
    pub(crate) fn patch_rows(&mut self, mut f: impl FnMut(&mut Transaction)) {
        if let Some(page) = self.all.as_mut() {
            page.data.iter_mut().for_each(&mut f);
        }
        if let Some(rows) = self.filtered.as_mut() {
            rows.iter_mut().for_each(&mut f);
        }
    }
}

/// `TransactionLists` shared between the two transaction loaders and the view.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedLists(Arc<RwLock<TransactionLists>>);

impl SharedLists {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, TransactionLists> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, TransactionLists> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of both lists taken under one read lock.
    pub(crate) fn get(&self) -> TransactionLists {
        self.read().clone()
    }
}
