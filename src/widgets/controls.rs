use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

/// Key hints shown while the table has focus.
pub const TABLE_CONTROLS: [(&str, &str); 7] = [
    ("Tab", "Toolbar"),
    ("m", "Column"),
    ("c", "Cell"),
    ("Spc", "Row"),
    ("v", "Col"),
    ("?", "Help"),
    ("q", "Quit"),
];

pub struct Controls {
    pub row_count: Option<usize>,
    pub column_count: Option<usize>,
    /// Rows held by the clipboard; shown when non-zero
    pub clipboard_rows: usize,
    pub dimmed: bool,
    pub controls: Vec<(&'static str, &'static str)>,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            row_count: None,
            column_count: None,
            clipboard_rows: 0,
            dimmed: false,
            controls: TABLE_CONTROLS.to_vec(),
            bg_color: Color::DarkGray,
            key_color: Color::Reset,
            label_color: Color::Reset,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(rows: usize, columns: usize) -> Self {
        Self {
            row_count: Some(rows),
            column_count: Some(columns),
            ..Self::default()
        }
    }

    pub fn with_clipboard_rows(mut self, rows: usize) -> Self {
        self.clipboard_rows = rows;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_colors(mut self, bg: Color, key: Color, label: Color) -> Self {
        self.bg_color = bg;
        self.key_color = key;
        self.label_color = label;
        self
    }

    pub fn with_custom_controls(mut self, controls: Vec<(&'static str, &'static str)>) -> Self {
        self.controls = controls;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.controls.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });

        let mut status = Vec::new();
        if self.clipboard_rows > 0 {
            status.push(format!("{} copied", self.clipboard_rows));
        }
        match (self.row_count, self.column_count) {
            (Some(rows), Some(cols)) => status.push(format!("{} x {}", rows, cols)),
            (Some(rows), None) => status.push(format!("Rows: {}", rows)),
            _ => {}
        }
        let status_text = (!status.is_empty()).then(|| status.join(" | "));
        if let Some(text) = &status_text {
            constraints.push(Constraint::Length(text.chars().count() as u16 + 2));
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let key_style = if self.dimmed {
            base_style.add_modifier(Modifier::BOLD)
        } else {
            base_style.fg(self.key_color).add_modifier(Modifier::BOLD)
        };
        let label_style = if self.dimmed {
            base_style.bg(self.bg_color)
        } else {
            base_style.bg(self.bg_color).fg(self.label_color)
        };

        for (i, (key, action)) in self.controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(key_style)
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        let mut fill_start_idx = self.controls.len() * 2;
        if let Some(text) = status_text {
            Paragraph::new(text)
                .style(label_style)
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(self.bg_color))
            .render(layout[fill_start_idx], buf);
    }
}
