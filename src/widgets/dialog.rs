//! Options dialog: collects a map of named values from an ordered list of option specs.
//!
//! Keys: `Up`/`Down`/`Tab` move between fields, `Left`/`Right` cycle combo boxes
//! and step spin boxes, `Space` toggles check boxes, `Enter` accepts, `Esc` cancels.
//! Entry fields take typed text while focused.

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};

use super::text_input::TextInput;

#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    ComboBox(Vec<String>),
    CheckBox,
    SpinBox { min: i64, max: i64 },
    Entry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Flag(bool),
    Number(i64),
}

impl OptionValue {
    pub fn display(&self) -> String {
        match self {
            OptionValue::Text(s) => s.clone(),
            OptionValue::Flag(true) => "[x]".to_string(),
            OptionValue::Flag(false) => "[ ]".to_string(),
            OptionValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub label: String,
    pub kind: OptionKind,
    pub default: OptionValue,
    pub tooltip: String,
}

impl OptionSpec {
    pub fn combo(name: &str, label: &str, items: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: OptionKind::ComboBox(items.iter().map(|s| s.to_string()).collect()),
            default: OptionValue::Text(default.to_string()),
            tooltip: String::new(),
        }
    }

    /// Combo box over owned items, e.g. the dataset's column names.
    pub fn combo_owned(name: &str, label: &str, items: Vec<String>) -> Self {
        let default = items.first().cloned().unwrap_or_default();
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: OptionKind::ComboBox(items),
            default: OptionValue::Text(default),
            tooltip: String::new(),
        }
    }

    pub fn check(name: &str, label: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: OptionKind::CheckBox,
            default: OptionValue::Flag(default),
            tooltip: String::new(),
        }
    }

    pub fn spin(name: &str, label: &str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: OptionKind::SpinBox { min, max },
            default: OptionValue::Number(default.clamp(min, max)),
            tooltip: String::new(),
        }
    }

    pub fn entry(name: &str, label: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: OptionKind::Entry,
            default: OptionValue::Text(default.to_string()),
            tooltip: String::new(),
        }
    }

    pub fn with_tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = tooltip.to_string();
        self
    }
}

/// Values reported by an accepted dialog, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionValues(BTreeMap<String, OptionValue>);

impl OptionValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// Text value; `""` when absent or not text.
    pub fn text(&self, name: &str) -> &str {
        match self.0.get(name) {
            Some(OptionValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(OptionValue::Flag(true)))
    }

    pub fn number(&self, name: &str) -> i64 {
        match self.0.get(name) {
            Some(OptionValue::Number(n)) => *n,
            _ => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    /// Still open
    Pending,
    Accepted(OptionValues),
    Cancelled,
}

pub struct OptionsDialog {
    pub title: String,
    specs: Vec<OptionSpec>,
    values: Vec<OptionValue>,
    /// One text input per Entry spec, `None` for other kinds
    inputs: Vec<Option<TextInput>>,
    focus: usize,
}

impl OptionsDialog {
    pub fn new(title: &str, specs: Vec<OptionSpec>) -> Self {
        let values: Vec<OptionValue> = specs.iter().map(|s| s.default.clone()).collect();
        let inputs = specs
            .iter()
            .map(|s| match (&s.kind, &s.default) {
                (OptionKind::Entry, OptionValue::Text(text)) => {
                    Some(TextInput::new().with_value(text.clone()))
                }
                (OptionKind::Entry, _) => Some(TextInput::new()),
                _ => None,
            })
            .collect();
        let mut dialog = Self {
            title: title.to_string(),
            specs,
            values,
            inputs,
            focus: 0,
        };
        dialog.sync_focus();
        dialog
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Current values, including text typed into entries.
    pub fn values(&self) -> OptionValues {
        let mut out = OptionValues::new();
        for (i, spec) in self.specs.iter().enumerate() {
            let value = match &self.inputs[i] {
                Some(input) => OptionValue::Text(input.value().to_string()),
                None => self.values[i].clone(),
            };
            out.insert(spec.name.clone(), value);
        }
        out
    }

    /// Set a value programmatically. Unknown names are ignored.
    pub fn set_value(&mut self, name: &str, value: OptionValue) {
        if let Some(i) = self.specs.iter().position(|s| s.name == name) {
            if let (Some(input), OptionValue::Text(text)) = (self.inputs[i].as_mut(), &value) {
                input.set_value(text.clone());
            }
            self.values[i] = value;
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> DialogOutcome {
        match event.code {
            KeyCode::Esc => return DialogOutcome::Cancelled,
            KeyCode::Enter => return DialogOutcome::Accepted(self.values()),
            KeyCode::Down | KeyCode::Tab => self.move_focus(1),
            KeyCode::Up | KeyCode::BackTab => self.move_focus(-1),
            _ => {
                if let Some(input) = self.inputs.get_mut(self.focus).and_then(|i| i.as_mut()) {
                    input.handle_key(event);
                } else {
                    self.adjust_focused(event.code);
                }
            }
        }
        DialogOutcome::Pending
    }

    fn move_focus(&mut self, delta: isize) {
        if self.specs.is_empty() {
            return;
        }
        let n = self.specs.len() as isize;
        self.focus = ((self.focus as isize + delta).rem_euclid(n)) as usize;
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        let focus = self.focus;
        for (i, input) in self.inputs.iter_mut().enumerate() {
            if let Some(input) = input {
                input.set_focused(i == focus);
            }
        }
    }

    fn adjust_focused(&mut self, code: KeyCode) {
        let Some(spec) = self.specs.get(self.focus) else {
            return;
        };
        let value = &mut self.values[self.focus];
        match (&spec.kind, value) {
            (OptionKind::ComboBox(items), OptionValue::Text(current)) if !items.is_empty() => {
                let step: isize = match code {
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => 1,
                    KeyCode::Left | KeyCode::Char('h') => -1,
                    _ => return,
                };
                let pos = items.iter().position(|s| s == current).unwrap_or(0) as isize;
                let next = (pos + step).rem_euclid(items.len() as isize) as usize;
                *current = items[next].clone();
            }
            (OptionKind::CheckBox, OptionValue::Flag(on)) => {
                if matches!(
                    code,
                    KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right | KeyCode::Char('x')
                ) {
                    *on = !*on;
                }
            }
            (OptionKind::SpinBox { min, max }, OptionValue::Number(n)) => match code {
                KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('l') => {
                    *n = (*n + 1).min(*max)
                }
                KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('h') => {
                    *n = (*n - 1).max(*min)
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// Renders an [`OptionsDialog`] as a centered bordered box with one line per option.
pub struct OptionsDialogView<'a> {
    pub dialog: &'a OptionsDialog,
    pub border_color: Color,
    pub active_color: Color,
}

impl<'a> OptionsDialogView<'a> {
    pub fn new(dialog: &'a OptionsDialog, border_color: Color, active_color: Color) -> Self {
        Self {
            dialog,
            border_color,
            active_color,
        }
    }

    /// Height needed to show every option plus tooltip and hint lines.
    pub fn required_height(&self) -> u16 {
        self.dialog.specs.len() as u16 + 6
    }
}

impl Widget for OptionsDialogView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
            .title(format!(" {} ", self.dialog.title));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1), // tooltip
                Constraint::Length(1), // key hints
            ])
            .split(inner);

        let label_width = self
            .dialog
            .specs
            .iter()
            .map(|s| s.label.chars().count())
            .max()
            .unwrap_or(0) as u16
            + 2;

        for (i, spec) in self.dialog.specs.iter().enumerate() {
            let y = rows[0].y + i as u16;
            if y >= rows[0].bottom() {
                break;
            }
            let focused = i == self.dialog.focus;
            let label_style = if focused {
                Style::default()
                    .fg(self.active_color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let label_area = Rect::new(rows[0].x, y, label_width.min(rows[0].width), 1);
            Paragraph::new(Span::styled(format!("{}:", spec.label), label_style))
                .render(label_area, buf);

            let value_area = Rect::new(
                label_area.right(),
                y,
                rows[0].width.saturating_sub(label_area.width),
                1,
            );
            if let Some(input) = &self.dialog.inputs[i] {
                input.render(value_area, buf);
                continue;
            }
            let value = &self.dialog.values[i];
            let text = match (&spec.kind, value) {
                (OptionKind::ComboBox(_), OptionValue::Text(s)) => {
                    let shown = if s.is_empty() { "(none)" } else { s.as_str() };
                    format!("< {} >", shown)
                }
                (OptionKind::SpinBox { .. }, OptionValue::Number(n)) => format!("- {} +", n),
                _ => value.display(),
            };
            let value_style = if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Paragraph::new(Span::styled(text, value_style)).render(value_area, buf);
        }

        let tooltip = self
            .dialog
            .specs
            .get(self.dialog.focus)
            .map(|s| s.tooltip.trim())
            .unwrap_or("");
        Paragraph::new(Span::styled(
            tooltip.to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .render(rows[1], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" OK  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Cancel  "),
            Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Change"),
        ]))
        .render(rows[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample() -> OptionsDialog {
        OptionsDialog::new(
            "Test",
            vec![
                OptionSpec::combo("method", "Method", &["a", "", "b"], ""),
                OptionSpec::check("limit", "Limit", true),
                OptionSpec::spin("round", "Round", 0, 2, 0),
                OptionSpec::entry("sep", "Separator", ","),
            ],
        )
    }

    #[test]
    fn test_accept_returns_defaults() {
        let mut dialog = sample();
        match dialog.handle_key(&key(KeyCode::Enter)) {
            DialogOutcome::Accepted(values) => {
                assert_eq!(values.len(), 4);
                assert_eq!(values.text("method"), "");
                assert!(values.flag("limit"));
                assert_eq!(values.number("round"), 0);
                assert_eq!(values.text("sep"), ",");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_cancel() {
        let mut dialog = sample();
        assert_eq!(dialog.handle_key(&key(KeyCode::Esc)), DialogOutcome::Cancelled);
    }

    #[test]
    fn test_editing_each_kind() {
        let mut dialog = sample();
        dialog.handle_key(&key(KeyCode::Right));
        assert_eq!(dialog.values().text("method"), "b");
        dialog.handle_key(&key(KeyCode::Right));
        assert_eq!(dialog.values().text("method"), "a");

        dialog.handle_key(&key(KeyCode::Down));
        dialog.handle_key(&key(KeyCode::Char(' ')));
        assert!(!dialog.values().flag("limit"));

        dialog.handle_key(&key(KeyCode::Down));
        for _ in 0..5 {
            dialog.handle_key(&key(KeyCode::Right));
        }
        assert_eq!(dialog.values().number("round"), 2);

        dialog.handle_key(&key(KeyCode::Down));
        dialog.handle_key(&key(KeyCode::Backspace));
        dialog.handle_key(&key(KeyCode::Char(';')));
        assert_eq!(dialog.values().text("sep"), ";");

        // wraps back to the first field
        dialog.handle_key(&key(KeyCode::Tab));
        assert_eq!(dialog.focus(), 0);
    }

    #[test]
    fn test_set_value() {
        let mut dialog = sample();
        dialog.set_value("sep", OptionValue::Text("\t".to_string()));
        dialog.set_value("missing", OptionValue::Flag(true));
        assert_eq!(dialog.values().text("sep"), "\t");
        assert!(dialog.values().get("missing").is_none());
    }
}
