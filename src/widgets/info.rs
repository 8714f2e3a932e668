//! Info panel: shape, per-column dtype and missing count, estimated memory.

use std::collections::BTreeMap;
use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Row, StatefulWidget, Table, TableState, Widget};

use crate::model::{ColumnSummary, DatasetSummary};

/// Human-readable byte size (e.g. "1.2 MiB", "456 KiB").
pub fn format_bytes(n: u64) -> String {
    const K: u64 = 1024;
    const M: u64 = K * K;
    const G: u64 = M * K;
    if n >= G {
        format!("{:.1} GiB", n as f64 / G as f64)
    } else if n >= M {
        format!("{:.1} MiB", n as f64 / M as f64)
    } else if n >= K {
        format!("{:.1} KiB", n as f64 / K as f64)
    } else {
        format!("{} B", n)
    }
}

/// Open/closed state and the column table's scroll position.
#[derive(Default)]
pub struct InfoModal {
    pub active: bool,
    pub selected: usize,
    pub table_state: TableState,
}

impl InfoModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.active = true;
        self.selected = 0;
        self.table_state.select(Some(0));
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    /// Returns false once the panel should close.
    pub fn handle_key(&mut self, event: &KeyEvent, total_rows: usize) -> bool {
        match event.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('i') | KeyCode::Enter => {
                self.close();
                return false;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < total_rows {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            _ => {}
        }
        self.table_state.select(Some(self.selected));
        true
    }
}

pub struct DataTableInfo<'a> {
    summary: &'a DatasetSummary,
    path: Option<&'a Path>,
    modal: &'a mut InfoModal,
    border_color: Color,
}

impl<'a> DataTableInfo<'a> {
    pub fn new(
        summary: &'a DatasetSummary,
        path: Option<&'a Path>,
        modal: &'a mut InfoModal,
        border_color: Color,
    ) -> Self {
        Self {
            summary,
            path,
            modal,
            border_color,
        }
    }

    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![];
        if let Some(path) = self.path {
            lines.push(format!("File: {}", path.display()));
        }
        lines.push(format!(
            "Rows: {} · Columns: {}",
            format_int(self.summary.rows),
            self.summary.columns.len()
        ));
        let index = match &self.summary.index_name {
            Some(name) => format!("Index: {} ({})", name, self.summary.index_dtype),
            None => format!("Index: range ({})", self.summary.index_dtype),
        };
        lines.push(index);
        lines.push(format!(
            "Memory (estimated): {}",
            format_bytes(self.summary.estimated_bytes as u64)
        ));
        let by_type = columns_by_type(&self.summary.columns);
        if !by_type.is_empty() {
            lines.push(by_type);
        }
        lines
    }

    fn render_column_table(&mut self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(vec!["Column", "Type", "Missing"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = self
            .summary
            .columns
            .iter()
            .map(|c| {
                Row::new(vec![
                    c.name.clone(),
                    c.dtype.clone(),
                    format_int(c.missing),
                ])
            })
            .collect();
        let widths = [
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Percentage(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(table, area, buf, &mut self.modal.table_state);
    }
}

fn format_int(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.insert(0, ',');
        }
        out.insert(0, c);
    }
    out
}

fn columns_by_type(columns: &[ColumnSummary]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for c in columns {
        *counts.entry(c.dtype.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(" · ")
}

impl Widget for &mut DataTableInfo<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
            .padding(Padding::horizontal(1))
            .title(Line::from("Info").centered());
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.summary_lines();
        let summary_height = (lines.len() as u16 + 1).min(inner.height);
        Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>()).render(
            Rect {
                height: summary_height,
                ..inner
            },
            buf,
        );

        let rest = Rect {
            y: inner.y + summary_height,
            height: inner.height.saturating_sub(summary_height),
            ..inner
        };
        if rest.height > 0 {
            self.render_column_table(rest, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MiB");
    }

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(0), "0");
        assert_eq!(format_int(999), "999");
        assert_eq!(format_int(1234567), "1,234,567");
    }

    #[test]
    fn test_columns_by_type() {
        let col = |name: &str, dtype: &str| ColumnSummary {
            name: name.into(),
            dtype: dtype.into(),
            missing: 0,
        };
        let text = columns_by_type(&[col("a", "i64"), col("b", "str"), col("c", "i64")]);
        assert_eq!(text, "i64: 2 · str: 1");
    }

    #[test]
    fn test_modal_keys() {
        let mut modal = InfoModal::new();
        modal.open();
        assert!(modal.handle_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), 3));
        assert_eq!(modal.selected, 1);
        assert!(!modal.handle_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), 3));
        assert!(!modal.active);
    }

    #[test]
    fn test_render_lists_columns() {
        let summary = DatasetSummary {
            rows: 2,
            columns: vec![ColumnSummary {
                name: "price".into(),
                dtype: "f64".into(),
                missing: 1,
            }],
            index_name: None,
            index_dtype: "i64".into(),
            estimated_bytes: 16,
        };
        let mut modal = InfoModal::new();
        modal.open();
        let area = Rect::new(0, 0, 50, 14);
        let mut buf = Buffer::empty(area);
        DataTableInfo::new(&summary, None, &mut modal, Color::Cyan).render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("price"));
        assert!(text.contains("Rows: 2"));
    }
}
