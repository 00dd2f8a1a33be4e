use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use spendcache_core::utils::{format_amount, format_date, truncate_string};
use spendcache_core::{Transaction, ViewMode, ViewMore};

use crate::app::{App, AppState};

use super::styles;

/// Recipient and employee names longer than this are cut with "...".
const NAME_COLUMN_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Employee filter
            Constraint::Min(6),    // Transactions
            Constraint::Length(1), // View more
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    app.employee_select
        .render_field(frame, chunks[1], app.snapshot.filter.is_loading);
    render_transactions(frame, app, chunks[2]);
    render_view_more(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    if matches!(app.state, AppState::SelectingEmployee) {
        app.employee_select.render_popup(frame, chunks[1]);
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  Spendcache";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_transactions(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.snapshot.mode {
        ViewMode::Empty => " Transactions ".to_string(),
        ViewMode::All => format!(" All transactions ({}) ", app.row_count()),
        ViewMode::Filtered => format!(
            " {} ({}) ",
            app.employee_select.selected().full_name(),
            app.row_count()
        ),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(matches!(app.state, AppState::Normal)));

    let Some(transactions) = app.snapshot.transactions.as_ref() else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " Loading transactions...",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    if transactions.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " No transactions",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Recipient"),
        Cell::from("Employee"),
        Cell::from(format!("{:>12}", "Amount")),
        Cell::from("Approved"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| transaction_row(tx, i == app.selection))
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn transaction_row(tx: &Transaction, selected: bool) -> Row<'static> {
    let style = if selected {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let (check, check_style) = if tx.approved {
        ("  [x]", styles::success_style())
    } else {
        ("  [ ]", styles::muted_style())
    };

    Row::new(vec![
        Cell::from(format_date(tx.date)),
        Cell::from(truncate_string(&tx.recipient, NAME_COLUMN_WIDTH)),
        Cell::from(truncate_string(&tx.employee.full_name(), NAME_COLUMN_WIDTH)),
        Cell::from(format!("{:>12}", format_amount(tx.amount))),
        Cell::from(Span::styled(check, check_style)),
    ])
    .style(style)
}

fn render_view_more(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.snapshot.view_more {
        ViewMore::Hidden => return,
        ViewMore::Disabled => Line::from(vec![
            Span::raw(" "),
            Span::styled("[ Loading... ]", styles::button_style(false)),
        ]),
        ViewMore::Enabled => Line::from(vec![
            Span::raw(" "),
            Span::styled("[m] View More", styles::button_style(true)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let cache = &app.snapshot.cache;
    let shortcuts = "[f]ilter | [r] clear cache | [q]uit";

    let (left_text, left_style) = match (&app.status_message, &app.last_error) {
        (Some(msg), Some(_)) => (format!(" {} ", msg), styles::error_style()),
        (Some(msg), None) => (format!(" {} ", msg), styles::muted_style()),
        (None, _) => (
            format!(
                " {} cached responses, updated {} ",
                cache.entries,
                cache.last_updated()
            ),
            styles::muted_style(),
        ),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(48, 20, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Spendcache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("j/k ↑/↓", "Move selection"),
        help_line("PgUp/PgDn", "Move by a page"),
        help_line("g/G", "First / last row"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("f", "Filter by employee"),
        help_line("Space", "Toggle approval"),
        help_line("m", "View more transactions"),
        help_line("r", "Clear response cache"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
