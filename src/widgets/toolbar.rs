//! Vertical command toolbar shown on the right edge of the table.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub const TOOLBAR_WIDTH: u16 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    Load,
    Save,
    ImportExcel,
    Copy,
    Paste,
    Plot,
    Pivot,
    Clean,
    Convert,
    Info,
}

impl ToolbarCommand {
    pub const ALL: [Self; 10] = [
        Self::Load,
        Self::Save,
        Self::ImportExcel,
        Self::Copy,
        Self::Paste,
        Self::Plot,
        Self::Pivot,
        Self::Clean,
        Self::Convert,
        Self::Info,
    ];

    pub fn key(self) -> char {
        match self {
            Self::Load => 'o',
            Self::Save => 's',
            Self::ImportExcel => 'e',
            Self::Copy => 'y',
            Self::Paste => 'p',
            Self::Plot => 'P',
            Self::Pivot => 't',
            Self::Clean => 'x',
            Self::Convert => 'n',
            Self::Info => 'i',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Load => "Load",
            Self::Save => "Save",
            Self::ImportExcel => "Import Excel",
            Self::Copy => "Copy",
            Self::Paste => "Paste",
            Self::Plot => "Plot",
            Self::Pivot => "Pivot",
            Self::Clean => "Clean Data",
            Self::Convert => "Convert",
            Self::Info => "Info",
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.key() == c)
    }
}

#[derive(Debug, Default)]
pub struct Toolbar {
    pub selected: usize,
    pub focused: bool,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys while the toolbar has focus. Enter or a command key triggers a button.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<ToolbarCommand> {
        let n = ToolbarCommand::ALL.len();
        match event.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = (self.selected + n - 1) % n;
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1) % n;
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Some(ToolbarCommand::ALL[self.selected]),
            KeyCode::Char(c) => ToolbarCommand::from_key(c),
            _ => None,
        }
    }
}

pub struct ToolbarView<'a> {
    toolbar: &'a Toolbar,
    border_color: Color,
    key_color: Color,
    dimmed: bool,
}

impl<'a> ToolbarView<'a> {
    pub fn new(toolbar: &'a Toolbar, border_color: Color, key_color: Color) -> Self {
        Self {
            toolbar,
            border_color,
            key_color,
            dimmed: false,
        }
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }
}

impl Widget for ToolbarView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.dimmed {
            Color::DarkGray
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(border));

        let lines: Vec<Line> = ToolbarCommand::ALL
            .iter()
            .enumerate()
            .map(|(i, cmd)| {
                let mut label_style = Style::default();
                if self.toolbar.focused && i == self.toolbar.selected {
                    label_style = label_style.add_modifier(Modifier::REVERSED);
                }
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", cmd.key()),
                        Style::default()
                            .fg(self.key_color)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(cmd.label(), label_style),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
