//! Pop-up context menus for the column header and for table cells.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCommand {
    SetIndex,
    SortAscending,
    SortDescending,
    ResetIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCommand {
    Copy,
    SetColor,
    ClearColor,
    Import,
    Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome<T> {
    Pending,
    Chosen(T),
    Closed,
}

#[derive(Debug, Clone)]
pub struct ContextMenu<T> {
    title: String,
    items: Vec<(&'static str, T)>,
    selected: usize,
}

impl ContextMenu<HeaderCommand> {
    /// Menu for the column under the cursor.
    pub fn header(column: &str) -> Self {
        Self::new(
            column,
            vec![
                ("Set as Index", HeaderCommand::SetIndex),
                ("Sort Ascending", HeaderCommand::SortAscending),
                ("Sort Descending", HeaderCommand::SortDescending),
                ("Reset Index", HeaderCommand::ResetIndex),
            ],
        )
    }
}

impl ContextMenu<CellCommand> {
    pub fn cell() -> Self {
        Self::new(
            "Cell",
            vec![
                ("Copy", CellCommand::Copy),
                ("Set Color", CellCommand::SetColor),
                ("Clear Color", CellCommand::ClearColor),
                ("Import", CellCommand::Import),
                ("Preferences", CellCommand::Preferences),
            ],
        )
    }
}

impl<T: Copy> ContextMenu<T> {
    pub fn new(title: &str, items: Vec<(&'static str, T)>) -> Self {
        Self {
            title: title.to_string(),
            items,
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.items.iter().map(|(label, _)| *label).collect()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> MenuOutcome<T> {
        let n = self.items.len();
        if n == 0 {
            return MenuOutcome::Closed;
        }
        match event.code {
            KeyCode::Esc | KeyCode::Char('q') => MenuOutcome::Closed,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = (self.selected + n - 1) % n;
                MenuOutcome::Pending
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1) % n;
                MenuOutcome::Pending
            }
            KeyCode::Enter => MenuOutcome::Chosen(self.items[self.selected].1),
            _ => MenuOutcome::Pending,
        }
    }

    /// Width and height needed to draw the menu with its border.
    pub fn size(&self) -> (u16, u16) {
        let widest = self
            .items
            .iter()
            .map(|(label, _)| label.chars().count())
            .chain(std::iter::once(self.title.chars().count()))
            .max()
            .unwrap_or(0);
        (widest as u16 + 4, self.items.len() as u16 + 2)
    }
}

pub struct ContextMenuView<'a, T> {
    menu: &'a ContextMenu<T>,
    border_color: Color,
}

impl<'a, T: Copy> ContextMenuView<'a, T> {
    pub fn new(menu: &'a ContextMenu<T>, border_color: Color) -> Self {
        Self { menu, border_color }
    }

    /// Place the menu at `anchor`, shifted to stay inside `bounds`.
    pub fn area(&self, anchor: (u16, u16), bounds: Rect) -> Rect {
        let (w, h) = self.menu.size();
        let w = w.min(bounds.width);
        let h = h.min(bounds.height);
        let x = anchor.0.min(bounds.right().saturating_sub(w)).max(bounds.x);
        let y = anchor.1.min(bounds.bottom().saturating_sub(h)).max(bounds.y);
        Rect::new(x, y, w, h)
    }
}

impl<T: Copy> Widget for ContextMenuView<'_, T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
            .title(Line::from(self.menu.title.as_str()));
        let items: Vec<ListItem> = self
            .menu
            .labels()
            .into_iter()
            .map(|label| ListItem::new(Line::from(label)))
            .collect();
        let mut state = ListState::default().with_selected(Some(self.menu.selected));
        StatefulWidget::render(
            List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
            buf,
            &mut state,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_header_menu_items() {
        let menu = ContextMenu::header("price");
        assert_eq!(
            menu.labels(),
            vec!["Set as Index", "Sort Ascending", "Sort Descending", "Reset Index"]
        );
    }

    #[test]
    fn test_navigation_wraps_and_chooses() {
        let mut menu = ContextMenu::cell();
        assert_eq!(menu.handle_key(&key(KeyCode::Up)), MenuOutcome::Pending);
        assert_eq!(menu.selected(), 4);
        assert_eq!(
            menu.handle_key(&key(KeyCode::Enter)),
            MenuOutcome::Chosen(CellCommand::Preferences)
        );
        menu.handle_key(&key(KeyCode::Down));
        menu.handle_key(&key(KeyCode::Down));
        assert_eq!(
            menu.handle_key(&key(KeyCode::Enter)),
            MenuOutcome::Chosen(CellCommand::SetColor)
        );
        assert_eq!(menu.handle_key(&key(KeyCode::Esc)), MenuOutcome::Closed);
    }

    #[test]
    fn test_area_stays_in_bounds() {
        let menu = ContextMenu::cell();
        let view = ContextMenuView::new(&menu, Color::Cyan);
        let bounds = Rect::new(0, 0, 40, 10);
        let area = view.area((38, 9), bounds);
        assert!(area.right() <= bounds.right());
        assert!(area.bottom() <= bounds.bottom());
    }
}
