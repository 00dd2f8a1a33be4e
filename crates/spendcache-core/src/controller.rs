//! The transactions view controller.
//!
//! Decides which loader is authoritative for the rendered list and keeps the
//! other one out of the way:
//!
//! - "all" mode: the paginated loader, grown a page at a time by "view more"
//! - "by employee" mode: the filtered loader, one full response per employee
//!
//! Switching modes always loads the new data first and only then invalidates
//! the old loader, in the same write, so the previous list stays on screen
//! until its replacement is ready.
//!
//! The controller is cheap to clone; clones share all state, so actions can
//! be spawned as tasks while the UI keeps calling `snapshot()`. Derived
//! state is computed from one copy of both lists.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{ApiError, DataSource, Endpoint};
use crate::cache::{CacheStats, CachedFetch, ResponseCache};
use crate::loaders::{
    EmployeeLoader, PaginatedTransactionsLoader, SharedLists, TransactionLists,
    TransactionsByEmployeeLoader,
};
use crate::models::{empty_employee, Employee, SetTransactionApprovalParams, Transaction};

/// Which loader the rendered list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Nothing loaded yet
    Empty,
    /// Paginated all-transactions list
    All,
    /// One employee's transactions
    Filtered,
}

/// Where an employee filter selection was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRoute {
    Ignored,
    AllTransactions,
    Employee(String),
}

/// State of the "View More" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMore {
    Hidden,
    /// Shown but inert while a page is loading
    Disabled,
    Enabled,
}

impl ViewMore {
    pub fn is_visible(&self) -> bool {
        !matches!(self, ViewMore::Hidden)
    }
}

/// Props for the employee filter dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeFilter {
    pub items: Vec<Employee>,
    pub is_loading: bool,
}

/// Everything the view needs, read in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub transactions: Option<Vec<Transaction>>,
    pub mode: ViewMode,
    pub filter: EmployeeFilter,
    pub view_more: ViewMore,
    pub cache: CacheStats,
}

/// Raises a flag for its lifetime.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct TransactionsView {
    employees: EmployeeLoader,
    paginated: PaginatedTransactionsLoader,
    by_employee: TransactionsByEmployeeLoader,
    writer: CachedFetch,
    /// Backing state of `paginated` and `by_employee`
    lists: SharedLists,
    /// Set only while the employee directory is being loaded by `load_all_transactions`
    directory_loading: Arc<AtomicBool>,
}

impl TransactionsView {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_cache(Arc::new(ResponseCache::new()), source)
    }

    /// Build the loaders around an existing cache. Each loader gets its own
    /// fetch handle (and loading flag) over the shared cache.
    pub fn with_cache(cache: Arc<ResponseCache>, source: Arc<dyn DataSource>) -> Self {
        let handle = || CachedFetch::new(Arc::clone(&cache), Arc::clone(&source));
        let lists = SharedLists::default();
        Self {
            employees: EmployeeLoader::new(handle()),
            paginated: PaginatedTransactionsLoader::with_lists(handle(), lists.clone()),
            by_employee: TransactionsByEmployeeLoader::with_lists(handle(), lists.clone()),
            writer: handle(),
            lists,
            directory_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn employees(&self) -> &EmployeeLoader {
        &self.employees
    }

    pub fn paginated(&self) -> &PaginatedTransactionsLoader {
        &self.paginated
    }

    pub fn by_employee(&self) -> &TransactionsByEmployeeLoader {
        &self.by_employee
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// First load. Runs `load_all_transactions` when the directory has never
    /// loaded and is not loading; returns whether it did.
    pub async fn init(&self) -> Result<bool, ApiError> {
        if self.employees.data().is_some() || self.employees.loading() {
            debug!("Init skipped, employees already loaded or loading");
            return Ok(false);
        }
        self.load_all_transactions().await?;
        Ok(true)
    }

    /// Directory, then the next page of all transactions, then drop the
    /// filtered list.
    pub async fn load_all_transactions(&self) -> Result<(), ApiError> {
        info!("Loading all transactions");

        {
            let _loading = LoadingFlag::raise(&self.directory_loading);
            self.employees.fetch_all().await?;
        }

        self.paginated
            .fetch_all_then(|lists| lists.filtered = None)
            .await
    }

    /// One employee's transactions, then drop the paginated list.
    pub async fn load_transactions_by_employee(&self, employee_id: &str) -> Result<(), ApiError> {
        info!(employee_id, "Loading transactions by employee");
        self.by_employee
            .fetch_by_id_then(employee_id, |lists| lists.all = None)
            .await
    }

    /// Route a filter selection: nothing selected is ignored, the "All
    /// Employees" entry loads everything, anything else filters.
    pub async fn select_employee(&self, selection: Option<Employee>) -> Result<FilterRoute, ApiError> {
        let Some(employee) = selection else {
            return Ok(FilterRoute::Ignored);
        };

        if employee.is_empty_employee() {
            self.load_all_transactions().await?;
            Ok(FilterRoute::AllTransactions)
        } else {
            self.load_transactions_by_employee(&employee.id).await?;
            Ok(FilterRoute::Employee(employee.id))
        }
    }

    /// Append the next page. Does nothing (returns false) when the control
    /// would not be offered.
    pub async fn view_more(&self) -> Result<bool, ApiError> {
        if !self.can_view_more() {
            debug!("View more ignored, no further pages in all-transactions mode");
            return Ok(false);
        }
        self.load_all_transactions().await?;
        Ok(true)
    }

    /// Write an approval change, then keep every copy of the row in step:
    /// cached transaction responses are dropped and the rows already held by
    /// both loaders are patched in place.
    pub async fn set_transaction_approval(&self, transaction_id: &str, value: bool) -> Result<(), ApiError> {
        info!(transaction_id, value, "Setting transaction approval");

        let params = SetTransactionApprovalParams {
            transaction_id: transaction_id.to_string(),
            value,
        };
        let _: serde_json::Value = self
            .writer
            .fetch_without_cache(Endpoint::SetTransactionApproval, &params)
            .await?;

        self.writer.clear_cache_by_endpoint(&[
            Endpoint::PaginatedTransactions,
            Endpoint::TransactionsByEmployee,
        ]);

        self.lists.write().patch_rows(|tx: &mut Transaction| {
            if tx.id == transaction_id {
                tx.approved = value;
            }
        });
        Ok(())
    }

    /// Forget every cached response. Loaded rows stay on screen; later
    /// fetches go back to the data source.
    pub fn clear_cache(&self) {
        info!("Clearing response cache");
        self.writer.clear_cache();
    }

    // =========================================================================
    // Derived view state
    // =========================================================================

    /// Paginated rows if loaded, else the filtered rows, else nothing.
    pub fn transactions(&self) -> Option<Vec<Transaction>> {
        rows_of(self.lists.get())
    }

    pub fn mode(&self) -> ViewMode {
        mode_of(&self.lists.read())
    }

    /// A list is shown, it is the all-transactions list, and a next page exists.
    pub fn can_view_more(&self) -> bool {
        can_view_more_of(&self.lists.read())
    }

    pub fn view_more_state(&self) -> ViewMore {
        let can_view_more = self.can_view_more();
        view_more_of(can_view_more, self.paginated.loading())
    }

    /// Dropdown items are `[All Employees, ...directory]`, or empty until the
    /// directory loads. Only the directory load marks the filter as loading.
    pub fn employee_filter(&self) -> EmployeeFilter {
        let items = match self.employees.data() {
            Some(employees) => std::iter::once(empty_employee()).chain(employees).collect(),
            None => Vec::new(),
        };
        EmployeeFilter {
            items,
            is_loading: self.directory_loading.load(Ordering::SeqCst),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let lists = self.lists.get();
        let mode = mode_of(&lists);
        let view_more = view_more_of(can_view_more_of(&lists), self.paginated.loading());
        ViewSnapshot {
            transactions: rows_of(lists),
            mode,
            filter: self.employee_filter(),
            view_more,
            cache: self.writer.cache().stats(),
        }
    }
}

fn rows_of(lists: TransactionLists) -> Option<Vec<Transaction>> {
    lists.all.map(|page| page.data).or(lists.filtered)
}

fn mode_of(lists: &TransactionLists) -> ViewMode {
    if lists.all.is_some() {
        ViewMode::All
    } else if lists.filtered.is_some() {
        ViewMode::Filtered
    } else {
        ViewMode::Empty
    }
}

fn can_view_more_of(lists: &TransactionLists) -> bool {
    lists.filtered.is_none() && lists.all.as_ref().is_some_and(|page| page.has_more())
}

fn view_more_of(can_view_more: bool, page_loading: bool) -> ViewMore {
    if !can_view_more {
        ViewMore::Hidden
    } else if page_loading {
        ViewMore::Disabled
    } else {
        ViewMore::Enabled
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::test_support::{ann_lee, scenario_handler, wait_until, ScriptedSource};

    fn view() -> (TransactionsView, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new(scenario_handler));
        (TransactionsView::new(source.clone()), source)
    }

    fn gated_view() -> (TransactionsView, Arc<ScriptedSource>, Arc<tokio::sync::Semaphore>) {
        let (source, gate) = ScriptedSource::gated(scenario_handler);
        let source = Arc::new(source);
        (TransactionsView::new(source.clone()), source, gate)
    }

    fn rendered(view: &TransactionsView) -> Option<Vec<String>> {
        view.transactions()
            .map(|txs| txs.into_iter().map(|tx| tx.id).collect())
    }

    // -------------------------------------------------------------------------
    // Scenario
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_mount_view_more_then_filter_scenario() {
        let (view, _) = view();
        assert_eq!(view.mode(), ViewMode::Empty);
        assert_eq!(view.transactions(), None);
        assert!(!view.view_more_state().is_visible());

        assert!(view.init().await.unwrap());
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));
        assert_eq!(view.view_more_state(), ViewMore::Enabled);
        assert_eq!(view.mode(), ViewMode::All);

        assert!(view.view_more().await.unwrap());
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string(), "tx_b".to_string()]));
        assert_eq!(view.view_more_state(), ViewMore::Hidden);

        let route = view.select_employee(Some(ann_lee())).await.unwrap();
        assert_eq!(route, FilterRoute::Employee("e1".to_string()));
        assert_eq!(rendered(&view), Some(vec!["tx_c".to_string()]));
        assert_eq!(view.view_more_state(), ViewMore::Hidden);
        assert!(view.paginated().data().is_none());
        assert_eq!(view.mode(), ViewMode::Filtered);
    }

    #[tokio::test]
    async fn test_init_runs_once() {
        let (view, source) = view();
        assert!(view.init().await.unwrap());
        assert!(!view.init().await.unwrap());
        assert_eq!(source.call_count(Endpoint::PaginatedTransactions), 1);
    }

    #[tokio::test]
    async fn test_filter_items_start_with_all_employees() {
        let (view, _) = view();
        assert_eq!(
            view.employee_filter(),
            EmployeeFilter { items: vec![], is_loading: false }
        );

        view.init().await.unwrap();
        assert_eq!(view.employee_filter().items, vec![empty_employee(), ann_lee()]);
    }

    // -------------------------------------------------------------------------
    // Mode exclusivity
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_modes_are_exclusive_after_each_load() {
        let (view, _) = view();
        view.init().await.unwrap();

        view.load_transactions_by_employee("e1").await.unwrap();
        assert!(view.paginated().data().is_none());
        assert!(view.by_employee().data().is_some());

        view.load_all_transactions().await.unwrap();
        assert!(view.by_employee().data().is_none());
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));
    }

    #[tokio::test]
    async fn test_select_routes_sentinel_and_employee() {
        let (view, source) = view();
        view.init().await.unwrap();

        assert_eq!(view.select_employee(None).await.unwrap(), FilterRoute::Ignored);

        let route = view
            .select_employee(Some(Employee::new("e7", "Eve", "Stone")))
            .await
            .unwrap();
        assert_eq!(route, FilterRoute::Employee("e7".to_string()));
        assert_eq!(
            source.calls().last().unwrap(),
            &(Endpoint::TransactionsByEmployee, json!({"employeeId": "e7"}))
        );

        let route = view.select_employee(Some(empty_employee())).await.unwrap();
        assert_eq!(route, FilterRoute::AllTransactions);
        assert_eq!(view.mode(), ViewMode::All);
    }

    // -------------------------------------------------------------------------
    // No flash to empty
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_filtered_load_keeps_previous_list_until_ready() {
        let (view, source, gate) = gated_view();
        gate.add_permits(2);
        view.init().await.unwrap();
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));

        let task = tokio::spawn({
            let view = view.clone();
            async move { view.load_transactions_by_employee("e1").await }
        });
        wait_until(|| source.call_count(Endpoint::TransactionsByEmployee) == 1).await;
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));
        assert!(view.by_employee().loading());

        gate.add_permits(1);
        task.await.unwrap().unwrap();
        assert_eq!(rendered(&view), Some(vec!["tx_c".to_string()]));
    }

    #[tokio::test]
    async fn test_all_load_keeps_filtered_list_until_ready() {
        let (view, source, gate) = gated_view();
        gate.add_permits(3);
        view.init().await.unwrap();
        view.load_transactions_by_employee("e1").await.unwrap();
        view.clear_cache();

        let task = tokio::spawn({
            let view = view.clone();
            async move { view.load_all_transactions().await }
        });

        wait_until(|| source.call_count(Endpoint::Employees) == 2).await;
        assert_eq!(rendered(&view), Some(vec!["tx_c".to_string()]));
        assert!(view.employee_filter().is_loading);

        gate.add_permits(1);
        wait_until(|| source.call_count(Endpoint::PaginatedTransactions) == 2).await;
        assert_eq!(rendered(&view), Some(vec!["tx_c".to_string()]));
        assert!(!view.employee_filter().is_loading);

        gate.add_permits(1);
        task.await.unwrap().unwrap();
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));
        assert!(view.by_employee().data().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_mode_switches_are_atomic_to_other_threads() {
        let (view, _) = view();
        view.init().await.unwrap();
        view.load_transactions_by_employee("e1").await.unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let reader = std::thread::spawn({
            let view = view.clone();
            let stop = Arc::clone(&stop);
            move || {
                let (mut reads, mut empties, mut inconsistent) = (0u64, 0u64, 0u64);
                loop {
                    reads += 1;
                    if view.transactions().is_none() {
                        empties += 1;
                    }

                    let snapshot = view.snapshot();
                    let first = snapshot
                        .transactions
                        .as_ref()
                        .and_then(|txs| txs.first())
                        .map(|tx| tx.id.clone());
                    let consistent = match snapshot.mode {
                        ViewMode::All => first.as_deref() == Some("tx_a") && snapshot.view_more.is_visible(),
                        ViewMode::Filtered => first.as_deref() == Some("tx_c") && !snapshot.view_more.is_visible(),
                        ViewMode::Empty => false,
                    };
                    if !consistent {
                        inconsistent += 1;
                    }
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                }
                (reads, empties, inconsistent)
            }
        });

        // Everything after the first round is served from the cache
        for _ in 0..2_000 {
            view.load_all_transactions().await.unwrap();
            view.load_transactions_by_employee("e1").await.unwrap();
        }
        stop.store(true, Ordering::SeqCst);

        let (reads, empties, inconsistent) = reader.join().unwrap();
        assert!(reads > 0);
        assert_eq!((empties, inconsistent), (0, 0));
    }

    // -------------------------------------------------------------------------
    // View more gating
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_view_more_hidden_in_filtered_mode_and_on_last_page() {
        let (view, source) = view();
        view.init().await.unwrap();
        view.load_transactions_by_employee("e1").await.unwrap();
        assert_eq!(view.view_more_state(), ViewMore::Hidden);
        assert!(!view.view_more().await.unwrap());

        view.load_all_transactions().await.unwrap();
        view.view_more().await.unwrap();
        assert_eq!(view.view_more_state(), ViewMore::Hidden);

        // No request with a null cursor is ever made
        let before = source.total_calls();
        assert!(!view.view_more().await.unwrap());
        assert_eq!(source.total_calls(), before);
    }

    #[tokio::test]
    async fn test_view_more_disabled_while_page_loads() {
        let (view, source, gate) = gated_view();
        gate.add_permits(2);
        view.init().await.unwrap();

        let task = tokio::spawn({
            let view = view.clone();
            async move { view.view_more().await }
        });
        wait_until(|| source.call_count(Endpoint::PaginatedTransactions) == 2).await;
        assert_eq!(view.view_more_state(), ViewMore::Disabled);
        // Employees came from the cache, so the filter never showed loading
        assert!(!view.employee_filter().is_loading);

        gate.add_permits(1);
        assert!(task.await.unwrap().unwrap());
        assert_eq!(view.view_more_state(), ViewMore::Hidden);
    }

    // -------------------------------------------------------------------------
    // Failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failed_directory_releases_filter_loading() {
        let source = Arc::new(ScriptedSource::new(|_, _| Err(ApiError::ServerError("down".to_string()))));
        let view = TransactionsView::new(source.clone());

        assert!(view.init().await.is_err());
        assert!(!view.employee_filter().is_loading);
        assert_eq!(view.mode(), ViewMode::Empty);
        assert_eq!(source.call_count(Endpoint::PaginatedTransactions), 0);
    }

    #[tokio::test]
    async fn test_failed_filtered_load_keeps_all_mode() {
        let source = Arc::new(ScriptedSource::new(|endpoint, params| match endpoint {
            Endpoint::TransactionsByEmployee => Err(ApiError::ServerError("down".to_string())),
            _ => scenario_handler(endpoint, params),
        }));
        let view = TransactionsView::new(source);
        view.init().await.unwrap();

        assert!(view.load_transactions_by_employee("e1").await.is_err());
        assert_eq!(view.mode(), ViewMode::All);
        assert_eq!(rendered(&view), Some(vec!["tx_a".to_string()]));
    }

    #[tokio::test]
    async fn test_overlapping_view_more_both_append() {
        // Known race: two in-flight "view more" chains read the same cursor
        let (view, source, gate) = gated_view();
        gate.add_permits(2);
        view.init().await.unwrap();

        let first = view.clone();
        let second = view.clone();
        let both = futures::future::join(
            async move { first.view_more().await },
            async move { second.view_more().await },
        );
        let task = tokio::spawn(both);

        wait_until(|| source.call_count(Endpoint::PaginatedTransactions) == 3).await;
        gate.add_permits(2);
        let (a, b) = task.await.unwrap();
        assert!(a.unwrap() && b.unwrap());

        assert_eq!(
            rendered(&view),
            Some(vec!["tx_a".to_string(), "tx_b".to_string(), "tx_b".to_string()])
        );
    }

    // -------------------------------------------------------------------------
    // Approval sync
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_approval_patches_rows_and_drops_transaction_cache() {
        let (view, source) = view();
        view.init().await.unwrap();

        view.set_transaction_approval("tx_a", true).await.unwrap();

        assert_eq!(
            source.calls().last().unwrap(),
            &(
                Endpoint::SetTransactionApproval,
                json!({"transactionId": "tx_a", "value": true})
            )
        );
        assert!(view.transactions().unwrap()[0].approved);
        // Only the employee directory is still cached
        assert_eq!(view.snapshot().cache.entries, 1);

        // Page 0 is fetched again on the next all-transactions load
        view.load_transactions_by_employee("e1").await.unwrap();
        view.load_all_transactions().await.unwrap();
        assert_eq!(source.call_count(Endpoint::PaginatedTransactions), 2);
    }

    #[tokio::test]
    async fn test_approval_failure_leaves_rows_untouched() {
        let source = Arc::new(ScriptedSource::new(|endpoint, params| match endpoint {
            Endpoint::SetTransactionApproval => {
                Err(ApiError::InvalidRequest("Invalid transaction to approve".to_string()))
            }
            _ => scenario_handler(endpoint, params),
        }));
        let view = TransactionsView::new(source);
        view.init().await.unwrap();

        assert!(view.set_transaction_approval("tx_a", true).await.is_err());
        assert!(!view.transactions().unwrap()[0].approved);
        assert_eq!(view.snapshot().cache.entries, 2);
    }

    #[tokio::test]
    async fn test_approval_patches_filtered_rows() {
        let (view, _) = view();
        view.init().await.unwrap();
        view.load_transactions_by_employee("e1").await.unwrap();

        view.set_transaction_approval("tx_c", true).await.unwrap();
        assert!(view.by_employee().data().unwrap()[0].approved);
    }
}
