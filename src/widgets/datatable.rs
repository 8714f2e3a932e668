//! Table view over a [`TableModel`].
//!
//! The view keeps only coordinates: cursor, scroll offsets, selected row and
//! column positions, and per-row colours. All of it is dropped when the
//! model's generation changes.

use std::collections::{BTreeSet, HashMap};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, StatefulWidget, Table, Widget},
};

use crate::model::{HeaderAxis, TableModel};

/// Row colours cycled by "Set Color".
pub const ROW_PALETTE: [Color; 6] = [
    Color::Indexed(52),
    Color::Indexed(22),
    Color::Indexed(17),
    Color::Indexed(58),
    Color::Indexed(53),
    Color::Indexed(23),
];

/// Widest a column is drawn, in characters.
const MAX_COLUMN_WIDTH: u16 = 40;

/// What a key press asks the owner of the table to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    None,
    OpenHeaderMenu,
    OpenCellMenu,
}

#[derive(Debug, Default)]
pub struct DataTableState {
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub start_row: usize,
    pub start_col: usize,
    /// Data rows that fit, set during render
    pub visible_rows: usize,
    /// Columns drawn in the last render
    pub visible_cols: usize,
    selected_rows: BTreeSet<usize>,
    selected_cols: BTreeSet<usize>,
    row_colors: HashMap<usize, Color>,
    generation: Option<u64>,
}

impl DataTableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything derived from a previous dataset when the model changed.
    /// Returns true when a reset happened.
    pub fn sync(&mut self, model: &TableModel) -> bool {
        let changed = self.generation != Some(model.generation());
        if changed {
            let visible_rows = self.visible_rows;
            *self = Self {
                visible_rows,
                generation: Some(model.generation()),
                ..Self::default()
            };
        }
        self.clamp(model.row_count(), model.column_count());
        changed
    }

    fn clamp(&mut self, rows: usize, cols: usize) {
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(cols.saturating_sub(1));
        self.start_row = self.start_row.min(self.cursor_row);
        if self.visible_rows > 0 && self.cursor_row >= self.start_row + self.visible_rows {
            self.start_row = self.cursor_row + 1 - self.visible_rows;
        }
        self.start_col = self.start_col.min(self.cursor_col);
    }

    pub fn move_cursor(&mut self, rows: isize, cols: isize, model: &TableModel) {
        self.cursor_row = self.cursor_row.saturating_add_signed(rows);
        self.cursor_col = self.cursor_col.saturating_add_signed(cols);
        self.clamp(model.row_count(), model.column_count());
    }

    pub fn page_down(&mut self, model: &TableModel) {
        let page = self.visible_rows.max(1) as isize;
        self.move_cursor(page, 0, model);
    }

    pub fn page_up(&mut self, model: &TableModel) {
        let page = self.visible_rows.max(1) as isize;
        self.move_cursor(-page, 0, model);
    }

    pub fn go_top(&mut self) {
        self.cursor_row = 0;
        self.start_row = 0;
    }

    pub fn go_bottom(&mut self, model: &TableModel) {
        self.cursor_row = model.row_count().saturating_sub(1);
        self.clamp(model.row_count(), model.column_count());
    }

    pub fn toggle_row_selection(&mut self) {
        if !self.selected_rows.remove(&self.cursor_row) {
            self.selected_rows.insert(self.cursor_row);
        }
    }

    pub fn toggle_column_selection(&mut self) {
        if !self.selected_cols.remove(&self.cursor_col) {
            self.selected_cols.insert(self.cursor_col);
        }
    }

    pub fn select_all_rows(&mut self, row_count: usize) {
        self.selected_rows = (0..row_count).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_rows.clear();
        self.selected_cols.clear();
    }

    pub fn is_row_selected(&self, row: usize) -> bool {
        self.selected_rows.contains(&row)
    }

    pub fn is_column_selected(&self, col: usize) -> bool {
        self.selected_cols.contains(&col)
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        self.selected_rows.iter().copied().collect()
    }

    pub fn selected_columns(&self) -> Vec<usize> {
        self.selected_cols.iter().copied().collect()
    }

    /// Selected rows, or the cursor row when nothing is selected.
    pub fn target_rows(&self, row_count: usize) -> Vec<usize> {
        if self.selected_rows.is_empty() {
            if row_count == 0 {
                Vec::new()
            } else {
                vec![self.cursor_row]
            }
        } else {
            self.selected_rows()
        }
    }

    /// Move each target row to the next palette colour.
    pub fn cycle_row_color(&mut self, rows: &[usize]) {
        for &row in rows {
            let next = match self.row_colors.get(&row) {
                Some(current) => ROW_PALETTE
                    .iter()
                    .position(|c| c == current)
                    .map_or(0, |i| (i + 1) % ROW_PALETTE.len()),
                None => 0,
            };
            self.row_colors.insert(row, ROW_PALETTE[next]);
        }
    }

    pub fn clear_row_color(&mut self, rows: &[usize]) {
        for row in rows {
            self.row_colors.remove(row);
        }
    }

    pub fn row_color(&self, row: usize) -> Option<Color> {
        self.row_colors.get(&row).copied()
    }

    pub fn handle_key(&mut self, event: &KeyEvent, model: &TableModel) -> TableAction {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('a') if ctrl => self.select_all_rows(model.row_count()),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0, model),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0, model),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1, model),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1, model),
            KeyCode::PageDown => self.page_down(model),
            KeyCode::PageUp => self.page_up(model),
            KeyCode::Home | KeyCode::Char('g') => self.go_top(),
            KeyCode::End | KeyCode::Char('G') => self.go_bottom(model),
            KeyCode::Char(' ') => self.toggle_row_selection(),
            KeyCode::Char('v') => self.toggle_column_selection(),
            KeyCode::Esc => self.clear_selection(),
            KeyCode::Char('m') => return TableAction::OpenHeaderMenu,
            KeyCode::Enter | KeyCode::Char('c') => return TableAction::OpenCellMenu,
            _ => {}
        }
        TableAction::None
    }
}

pub struct DataTable<'a> {
    model: &'a TableModel,
    pub header_bg: Color,
    pub header_fg: Color,
    pub row_labels_fg: Color,
    pub selection_bg: Color,
    pub table_cell_padding: u16,
    pub alternate_row_bg: Option<Color>,
    pub row_labels: bool,
}

impl<'a> DataTable<'a> {
    pub fn new(model: &'a TableModel) -> Self {
        Self {
            model,
            header_bg: Color::Indexed(236),
            header_fg: Color::White,
            row_labels_fg: Color::DarkGray,
            selection_bg: Color::Indexed(24),
            table_cell_padding: 1,
            alternate_row_bg: None,
            row_labels: true,
        }
    }

    pub fn with_colors(
        mut self,
        header_bg: Color,
        header_fg: Color,
        row_labels_fg: Color,
        selection_bg: Color,
    ) -> Self {
        self.header_bg = header_bg;
        self.header_fg = header_fg;
        self.row_labels_fg = row_labels_fg;
        self.selection_bg = selection_bg;
        self
    }

    pub fn with_cell_padding(mut self, padding: u16) -> Self {
        self.table_cell_padding = padding;
        self
    }

    pub fn with_alternate_row_bg(mut self, color: Option<Color>) -> Self {
        self.alternate_row_bg = color;
        self
    }

    pub fn with_row_labels(mut self, show: bool) -> Self {
        self.row_labels = show;
        self
    }

    fn header_style(&self) -> Style {
        if self.header_bg == Color::Reset {
            Style::default().fg(self.header_fg)
        } else {
            Style::default().bg(self.header_bg).fg(self.header_fg)
        }
    }

    /// Background for a data row: user colour, then selection, then alternating shade.
    fn row_bg(&self, state: &DataTableState, row: usize, offset: usize) -> Option<Color> {
        if state.is_row_selected(row) {
            Some(self.selection_bg)
        } else if let Some(color) = state.row_color(row) {
            Some(color)
        } else {
            self.alternate_row_bg.filter(|_| offset % 2 == 1)
        }
    }

    /// Width of one column over the visible rows, header included.
    fn column_width(&self, col: usize, start_row: usize, rows: usize) -> u16 {
        let header = self
            .model
            .header_label(HeaderAxis::Horizontal, col)
            .chars()
            .count();
        (start_row..start_row + rows)
            .map(|r| self.model.value_at(r, col).chars().count())
            .fold(header, usize::max)
            .min(MAX_COLUMN_WIDTH as usize) as u16
    }

    /// Columns that fit from `start_col`, with their widths. The last one may be cut.
    fn fit_columns(&self, start_col: usize, start_row: usize, rows: usize, width: u16) -> Vec<(usize, u16)> {
        let mut used: u16 = 0;
        let mut out = Vec::new();
        for col in start_col..self.model.column_count() {
            let w = self.column_width(col, start_row, rows);
            if used + w > width {
                let rest = width.saturating_sub(used);
                if rest > 0 && out.is_empty() {
                    out.push((col, rest));
                }
                break;
            }
            out.push((col, w));
            used += w + self.table_cell_padding;
        }
        out
    }

    fn render_dataframe(
        &self,
        area: Rect,
        buf: &mut Buffer,
        state: &DataTableState,
        columns: &[(usize, u16)],
        rows: usize,
    ) {
        let header_cells: Vec<Cell> = columns
            .iter()
            .map(|&(col, _)| {
                let mut style = Style::default().add_modifier(Modifier::BOLD);
                if state.is_column_selected(col) {
                    style = style.bg(self.selection_bg);
                }
                if col == state.cursor_col {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                Cell::from(Span::styled(
                    self.model.header_label(HeaderAxis::Horizontal, col),
                    style,
                ))
            })
            .collect();

        let table_rows: Vec<Row> = (0..rows)
            .map(|offset| {
                let row = state.start_row + offset;
                let row_style = match self.row_bg(state, row, offset) {
                    Some(bg) => Style::default().bg(bg),
                    None => Style::default(),
                };
                let cells: Vec<Cell> = columns
                    .iter()
                    .map(|&(col, _)| {
                        let mut style = Style::default();
                        if state.is_column_selected(col) && !state.is_row_selected(row) {
                            style = style.bg(self.selection_bg);
                        }
                        if row == state.cursor_row && col == state.cursor_col {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        Cell::from(Line::from(self.model.value_at(row, col))).style(style)
                    })
                    .collect();
                Row::new(cells).style(row_style)
            })
            .collect();

        let widths: Vec<u16> = columns.iter().map(|&(_, w)| w).collect();
        Widget::render(
            Table::new(table_rows, widths)
                .column_spacing(self.table_cell_padding)
                .header(Row::new(header_cells).style(self.header_style())),
            area,
            buf,
        );
    }

    fn render_row_labels(&self, area: Rect, buf: &mut Buffer, state: &DataTableState, rows: usize) {
        let header_text = self.model.index_name().unwrap_or("").to_string();
        Paragraph::new(format!("{:<width$}", header_text, width = area.width as usize))
            .style(self.header_style())
            .render(Rect { height: 1, ..area }, buf);

        for offset in 0..rows.min(area.height.saturating_sub(1) as usize) {
            let row = state.start_row + offset;
            let label = self.model.header_label(HeaderAxis::Vertical, row);
            let fg = if row == state.cursor_row {
                Color::Reset
            } else {
                self.row_labels_fg
            };
            let mut style = Style::default().fg(fg);
            if let Some(bg) = self.row_bg(state, row, offset) {
                style = style.bg(bg);
            }
            // Right-align labels, leaving one column of spacing
            let text = format!(
                "{:>width$} ",
                label,
                width = area.width.saturating_sub(1) as usize
            );
            Paragraph::new(text).style(style).render(
                Rect {
                    x: area.x,
                    y: area.y + offset as u16 + 1,
                    width: area.width,
                    height: 1,
                },
                buf,
            );
        }
    }

    fn row_labels_width(&self, start_row: usize, rows: usize) -> u16 {
        let name = self.model.index_name().map_or(0, |n| n.chars().count());
        let widest = (start_row..start_row + rows)
            .map(|r| self.model.header_label(HeaderAxis::Vertical, r).chars().count())
            .fold(name, usize::max)
            .max(1);
        (widest as u16).min(MAX_COLUMN_WIDTH) + 1
    }
}

impl StatefulWidget for DataTable<'_> {
    type State = DataTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.visible_rows = area.height.saturating_sub(1) as usize;
        state.sync(self.model);

        if self.model.column_count() == 0 {
            Paragraph::new("(no columns)")
                .centered()
                .render(area, buf);
            state.visible_cols = 0;
            return;
        }

        let rows = state
            .visible_rows
            .min(self.model.row_count().saturating_sub(state.start_row));

        let labels_width = if self.row_labels {
            self.row_labels_width(state.start_row, rows).min(area.width / 2)
        } else {
            0
        };
        let table_area = Rect {
            x: area.x + labels_width,
            width: area.width.saturating_sub(labels_width),
            ..area
        };

        // Scroll right until the cursor column is drawn
        let mut columns = self.fit_columns(state.start_col, state.start_row, rows, table_area.width);
        while state.start_col < state.cursor_col
            && !columns.iter().any(|&(c, _)| c == state.cursor_col)
        {
            state.start_col += 1;
            columns = self.fit_columns(state.start_col, state.start_row, rows, table_area.width);
        }
        state.visible_cols = columns.len();

        if self.row_labels && labels_width > 0 {
            self.render_row_labels(
                Rect {
                    width: labels_width,
                    ..area
                },
                buf,
                state,
                rows,
            );
        }
        self.render_dataframe(table_area, buf, state, &columns, rows);
    }
}
