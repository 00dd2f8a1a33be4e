//! Application state management for spendcache.
//!
//! `App` owns the view controller, the UI-only state (dropdown, row
//! selection, overlays) and the channel that spawned controller actions
//! report back on. Rendering reads `App::snapshot`, refreshed once per frame.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use spendcache_core::{empty_employee, Config, Employee, TransactionsView, ViewMore, ViewSnapshot};

use crate::ui::select::{InputSelect, SelectItem};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background action channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    SelectingEmployee,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// A controller action run in the background.
#[derive(Debug, Clone)]
pub enum Action {
    Init,
    SelectEmployee(Employee),
    ViewMore,
    SetApproval { transaction_id: String, value: bool },
}

impl Action {
    fn describe(&self) -> String {
        match self {
            Action::Init => "Initial load".to_string(),
            Action::SelectEmployee(employee) => format!("Loading {}", employee.full_name()),
            Action::ViewMore => "Loading more transactions".to_string(),
            Action::SetApproval { value: true, .. } => "Approving transaction".to_string(),
            Action::SetApproval { value: false, .. } => "Unapproving transaction".to_string(),
        }
    }
}

/// Sent back through the channel when a spawned action finishes.
enum ActionResult {
    Completed(Action),
    Failed(Action, String),
}

fn parse_employee(employee: &Employee) -> SelectItem {
    SelectItem {
        value: employee.id.clone(),
        label: employee.full_name(),
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub view: TransactionsView,
    pub snapshot: ViewSnapshot,

    pub state: AppState,
    pub employee_select: InputSelect<Employee>,
    pub selection: usize,
    pub status_message: Option<String>,
    pub last_error: Option<String>,

    action_tx: mpsc::Sender<ActionResult>,
    action_rx: mpsc::Receiver<ActionResult>,
    pending_actions: usize,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let source = config.build_source()?;
        Ok(Self::with_view(TransactionsView::new(source)))
    }

    pub fn with_view(view: TransactionsView) -> Self {
        let (action_tx, action_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let snapshot = view.snapshot();

        Self {
            view,
            snapshot,
            state: AppState::Normal,
            employee_select: InputSelect::new(
                "Filter by employee",
                "Loading employees",
                empty_employee(),
                parse_employee,
            ),
            selection: 0,
            status_message: None,
            last_error: None,
            action_tx,
            action_rx,
            pending_actions: 0,
        }
    }

    /// Kick off the first load. Called once after construction.
    pub fn start(&mut self) {
        self.spawn_action(Action::Init);
    }

    pub fn is_busy(&self) -> bool {
        self.pending_actions > 0
    }

    // =========================================================================
    // Background actions
    // =========================================================================

    /// Run `action` on the controller in a spawned task. Nothing stops a
    /// second action from starting while one is in flight.
    pub fn spawn_action(&mut self, action: Action) {
        debug!(?action, "Spawning action");
        self.status_message = Some(format!("{}...", action.describe()));
        self.pending_actions += 1;

        let view = self.view.clone();
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let outcome = match &action {
                Action::Init => view.init().await.map(|_| ()),
                Action::SelectEmployee(employee) => {
                    view.select_employee(Some(employee.clone())).await.map(|_| ())
                }
                Action::ViewMore => view.view_more().await.map(|_| ()),
                Action::SetApproval { transaction_id, value } => {
                    view.set_transaction_approval(transaction_id, *value).await
                }
            };

            let result = match outcome {
                Ok(()) => ActionResult::Completed(action),
                Err(e) => ActionResult::Failed(action, e.to_string()),
            };
            if tx.send(result).await.is_err() {
                debug!("Action result dropped, app is shutting down");
            }
        });
    }

    /// Drain finished actions and refresh the snapshot. Called every frame.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.action_rx.try_recv() {
            self.pending_actions = self.pending_actions.saturating_sub(1);
            match result {
                ActionResult::Completed(action) => {
                    info!(?action, "Action completed");
                    if !self.is_busy() {
                        self.status_message = None;
                        self.last_error = None;
                    }
                }
                ActionResult::Failed(action, message) => {
                    error!(?action, error = %message, "Action failed");
                    self.status_message = Some(format!("{} failed: {}", action.describe(), message));
                    self.last_error = Some(message);
                }
            }
        }
        self.refresh_snapshot();
    }

    pub fn refresh_snapshot(&mut self) {
        self.snapshot = self.view.snapshot();
        self.employee_select.set_items(self.snapshot.filter.items.clone());

        let rows = self.row_count();
        if self.selection >= rows {
            self.selection = rows.saturating_sub(1);
        }
    }

    // =========================================================================
    // User operations
    // =========================================================================

    pub fn row_count(&self) -> usize {
        self.snapshot.transactions.as_ref().map_or(0, Vec::len)
    }

    pub fn open_employee_filter(&mut self) {
        if self.employee_select.open(self.snapshot.filter.is_loading) {
            self.state = AppState::SelectingEmployee;
        }
    }

    pub fn close_employee_filter(&mut self) {
        self.employee_select.close();
        self.state = AppState::Normal;
    }

    /// Route the chosen filter entry to the controller.
    pub fn choose_employee(&mut self) {
        self.state = AppState::Normal;
        let Some(employee) = self.employee_select.choose() else {
            return;
        };
        debug!(employee_id = %employee.id, "Employee filter changed");
        self.selection = 0;
        self.spawn_action(Action::SelectEmployee(employee));
    }

    /// Only acts when the "View More" control is enabled.
    pub fn view_more(&mut self) {
        if self.snapshot.view_more == ViewMore::Enabled {
            self.spawn_action(Action::ViewMore);
        }
    }

    pub fn toggle_selected_approval(&mut self) {
        let Some(tx) = self
            .snapshot
            .transactions
            .as_ref()
            .and_then(|txs| txs.get(self.selection))
        else {
            return;
        };
        let action = Action::SetApproval {
            transaction_id: tx.id.clone(),
            value: !tx.approved,
        };
        self.spawn_action(action);
    }

    pub fn clear_cache(&mut self) {
        self.view.clear_cache();
        self.status_message = Some("Response cache cleared".to_string());
        self.refresh_snapshot();
    }

    pub fn select_next(&mut self, step: usize) {
        let max = self.row_count().saturating_sub(1);
        self.selection = (self.selection + step).min(max);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    pub fn select_last(&mut self) {
        self.selection = self.row_count().saturating_sub(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
