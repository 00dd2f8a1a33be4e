//! Generic dropdown.
//!
//! `InputSelect<T>` holds the item list, the current value and the open
//! popup's cursor. `parse_item` turns an item into its value/label pair.
//! Choosing an entry returns it to the caller, which plays the role of the
//! change callback.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::styles;

/// Value and label shown for one dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
}

pub struct InputSelect<T> {
    label: &'static str,
    loading_label: &'static str,
    parse_item: fn(&T) -> SelectItem,
    items: Vec<T>,
    selected: T,
    highlighted: usize,
    open: bool,
}

impl<T: Clone> InputSelect<T> {
    pub fn new(
        label: &'static str,
        loading_label: &'static str,
        default_value: T,
        parse_item: fn(&T) -> SelectItem,
    ) -> Self {
        Self {
            label,
            loading_label,
            parse_item,
            items: Vec::new(),
            selected: default_value,
            highlighted: 0,
            open: false,
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.highlighted = self.highlighted.min(self.items.len().saturating_sub(1));
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the popup on the current value. Refused while loading or empty.
    pub fn open(&mut self, is_loading: bool) -> bool {
        if is_loading || self.items.is_empty() {
            return false;
        }
        let current = (self.parse_item)(&self.selected).value;
        self.highlighted = self
            .items
            .iter()
            .position(|item| (self.parse_item)(item).value == current)
            .unwrap_or(0);
        self.open = true;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn move_down(&mut self) {
        self.highlighted = (self.highlighted + 1).min(self.items.len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Close the popup and return the highlighted item as the new value.
    pub fn choose(&mut self) -> Option<T> {
        if !self.open {
            return None;
        }
        self.open = false;
        let item = self.items.get(self.highlighted)?.clone();
        self.selected = item.clone();
        Some(item)
    }

    pub fn selected(&self) -> &T {
        &self.selected
    }

    pub fn display_label(&self, is_loading: bool) -> String {
        if is_loading {
            format!("{}...", self.loading_label)
        } else {
            (self.parse_item)(&self.selected).label
        }
    }

    /// Single-line field: `Label: [value v]`.
    pub fn render_field(&self, frame: &mut Frame, area: Rect, is_loading: bool) {
        let value_style = if is_loading {
            styles::muted_style()
        } else {
            styles::highlight_style()
        };
        let line = Line::from(vec![
            Span::styled(format!(" {}: ", self.label), styles::title_style()),
            Span::styled(format!("[{} \u{25be}]", self.display_label(is_loading)), value_style),
            Span::styled("  [f] change", styles::muted_style()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Popup list anchored under the field.
    pub fn render_popup(&self, frame: &mut Frame, anchor: Rect) {
        if !self.open {
            return;
        }
        let height = (self.items.len() as u16 + 2).min(frame.area().height.saturating_sub(anchor.y + 1));
        let width = self
            .items
            .iter()
            .map(|item| (self.parse_item)(item).label.chars().count() as u16)
            .max()
            .unwrap_or(0)
            .saturating_add(6)
            .max(24);
        // Keep the popup inside the frame on narrow terminals
        let area = Rect {
            x: anchor.x + 1,
            y: anchor.y + 1,
            width,
            height,
        }
        .intersection(frame.area());
        if area.is_empty() {
            return;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| ListItem::new((self.parse_item)(item).label).style(styles::list_item_style()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" {} ", self.label))
                    .title_style(styles::title_style())
                    .borders(Borders::ALL)
                    .border_style(styles::border_style(true)),
            )
            .highlight_style(styles::selected_style());

        let mut state = ListState::default();
        state.select(Some(self.highlighted));

        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }
}
