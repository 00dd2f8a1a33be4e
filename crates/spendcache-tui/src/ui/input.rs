//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` operations. Controller work is spawned by
//! the `App`, so nothing here awaits.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::SelectingEmployee => handle_filter_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        },
        AppState::Quitting => return Ok(true),
        AppState::Normal => handle_normal_input(app, key),
    }
    Ok(false)
}

fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('f') => app.close_employee_filter(),
        KeyCode::Down | KeyCode::Char('j') => app.employee_select.move_down(),
        KeyCode::Up | KeyCode::Char('k') => app.employee_select.move_up(),
        KeyCode::Enter => app.choose_employee(),
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('f') | KeyCode::Enter => app.open_employee_filter(),
        KeyCode::Char(' ') => app.toggle_selected_approval(),
        KeyCode::Char('m') => app.view_more(),
        KeyCode::Char('r') => app.clear_cache(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Home | KeyCode::Char('g') => app.selection = 0,
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        _ => {}
    }
}
