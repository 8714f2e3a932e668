use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap};

pub mod chart_data;
pub mod clean;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod convert;
pub mod error_display;
pub mod file_io;
pub mod frame_widget;
mod help_strings;
pub mod missing;
pub mod model;
pub mod pivot;
pub mod widgets;

pub use cli::{Args, FileFormat};
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use frame_widget::DataFrameWidget;
pub use model::TableModel;

use error_display::user_message_from_report;
use file_io::ImportOptions;
use widgets::controls::Controls;
use widgets::debug::DebugState;

pub const APP_NAME: &str = "dftable";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OpenOptions {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub format: Option<FileFormat>,
    pub excel_sheet: Option<String>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &cli::Args, config: &AppConfig) -> Self {
        let mut opts = OpenOptions::new();

        opts.delimiter = args.delimiter.or(config.file_loading.delimiter);
        opts.skip_rows = args.skip_rows.or(config.file_loading.skip_rows);

        // Handle has_header: CLI no_header flag overrides config
        opts.has_header = if let Some(no_header) = args.no_header {
            Some(!no_header)
        } else {
            config.file_loading.has_header
        };

        opts.format = args.format;
        opts.excel_sheet = args.excel_sheet.clone();
        opts
    }

    /// Reader options with these overrides applied over `base`.
    pub fn import_options(&self, base: &ImportOptions) -> ImportOptions {
        ImportOptions {
            delimiter: self.delimiter.unwrap_or(base.delimiter),
            has_header: self.has_header.unwrap_or(base.has_header),
            skip_rows: self.skip_rows.unwrap_or(base.skip_rows),
            excel_sheet: self
                .excel_sheet
                .clone()
                .or_else(|| base.excel_sheet.clone()),
        }
    }
}

impl From<&cli::Args> for OpenOptions {
    fn from(args: &cli::Args) -> Self {
        // Use default config if creating from args alone
        let config = AppConfig::default();
        Self::from_args_and_config(args, &config)
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    DoLoad(PathBuf, OpenOptions), // Internal event to actually perform loading after UI update
    Exit,
    Crash(String),
    Resize(u16, u16), // resized (width, height)
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

#[derive(Clone, Debug, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading {
        file_path: PathBuf,
        file_size: u64,
        current_phase: String,
        progress_percent: u16,
    },
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }
}

pub struct App {
    pub widget: DataFrameWidget,
    debug: DebugState,
    error_modal: ErrorModal,
    show_help: bool,
    help_scroll: usize,
    loading_state: LoadingState,
    theme: Theme,
}

impl App {
    fn render_loading_gauge(loading_state: &LoadingState, area: Rect, buf: &mut Buffer) {
        if let LoadingState::Loading {
            current_phase,
            progress_percent,
            ..
        } = loading_state
        {
            let gauge_width = (area.width as f64 * 0.33) as u16;
            let gauge_area = centered_area(area, gauge_width, 3);

            Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Loading"))
                .percent(*progress_percent)
                .label(current_phase.clone())
                .render(gauge_area, buf);
        }
    }

    pub fn new() -> Result<App> {
        let theme = Theme::from_config(&AppConfig::default().theme)?;
        Self::new_with_config(theme, AppConfig::default())
    }

    pub fn new_with_config(theme: Theme, app_config: AppConfig) -> Result<App> {
        Ok(App {
            widget: DataFrameWidget::new(&app_config)?,
            debug: DebugState {
                enabled: app_config.debug.enabled,
                ..DebugState::default()
            },
            error_modal: ErrorModal::new(),
            show_help: false,
            help_scroll: 0,
            loading_state: LoadingState::Idle,
            theme,
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_modal
            .active
            .then_some(self.error_modal.message.as_str())
    }

    pub fn is_loading(&self) -> bool {
        self.loading_state.is_loading()
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        // Handle error modal first - it has highest priority
        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if self.show_help {
            match event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Down | KeyCode::Char('j') => self.help_scroll += 1,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.help_scroll = self.help_scroll.saturating_sub(1)
                }
                _ => {}
            }
            return None;
        }

        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }
        if !self.widget.has_overlay() {
            match event.code {
                KeyCode::Char('q') => return Some(AppEvent::Exit),
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return None;
                }
                _ => {}
            }
        }

        if let Err(e) = self.widget.handle_key(event) {
            self.error_modal.show(user_message_from_report(&e, None));
        }
        self.debug.on_action(self.widget.last_action());
        None
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => {
                // Set loading state first, then trigger a render before actually loading
                let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                self.loading_state = LoadingState::Loading {
                    file_path: path.clone(),
                    file_size,
                    current_phase: "Reading file".to_string(),
                    progress_percent: 30,
                };
                Some(AppEvent::DoLoad(path.clone(), options.clone()))
            }
            AppEvent::DoLoad(path, options) => {
                let import = options.import_options(self.widget.import_options());
                self.widget.set_import_options(import);
                if let Err(e) = self.widget.load(path, options.format) {
                    self.error_modal
                        .show(user_message_from_report(&e, Some(path.as_path())));
                }
                self.debug.on_action(self.widget.last_action());
                self.loading_state = LoadingState::Idle;
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let help_area = centered_rect(area, 70, 80);
        Clear.render(help_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.color("modal_border")))
            .title(Line::from(" Help ").centered())
            .title_bottom(Line::from(" ↑↓ Scroll  Esc Close ").centered());
        Paragraph::new(help_strings::main_view())
            .block(block)
            .scroll((self.help_scroll.min(u16::MAX as usize) as u16, 0))
            .render(help_area, buf);
    }

    fn render_error(&self, area: Rect, buf: &mut Buffer) {
        let width = (area.width * 6 / 10).max(30).min(area.width);
        let inner_width = width.saturating_sub(4).max(1) as usize;
        let lines = self
            .error_modal
            .message
            .lines()
            .map(|l| l.chars().count() / inner_width + 1)
            .sum::<usize>()
            .max(1) as u16;
        let error_area = centered_area(area, width, lines + 4);
        Clear.render(error_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.color("modal_border_error")))
            .title(Line::from(" Error ").centered())
            .title_bottom(Line::from(" Enter/Esc Dismiss ").centered());
        Paragraph::new(self.error_modal.message.as_str())
            .style(Style::default().fg(self.color("error")))
            .block(block)
            .wrap(Wrap { trim: true })
            .render(error_area, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        // Set background color for the entire application area
        Block::default()
            .style(Style::default().bg(self.color("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let main_area = layout[0];

        if self.loading_state.is_loading() {
            App::render_loading_gauge(&self.loading_state, main_area, buf);
        } else {
            self.widget.render(main_area, buf, &self.theme);
        }

        if self.show_help {
            self.render_help(main_area, buf);
        }
        if self.error_modal.active {
            self.render_error(main_area, buf);
        }

        let mut controls = Controls::with_shape(
            self.widget.model.row_count(),
            self.widget.model.column_count(),
        )
        .with_clipboard_rows(self.widget.clipboard.row_count())
        .with_colors(
            self.color("controls_bg"),
            self.color("primary"),
            self.color("secondary"),
        );
        if self.error_modal.active {
            controls = controls.with_custom_controls(vec![("Enter", "Dismiss")]);
        } else if self.show_help {
            controls = controls.with_custom_controls(vec![("↑↓", "Scroll"), ("Esc", "Close")]);
        } else if let Some(custom) = self.widget.controls() {
            controls = controls.with_custom_controls(custom);
        }
        controls = controls.with_dimmed(self.error_modal.active || self.show_help);
        controls.render(layout[1], buf);

        if self.debug.enabled && layout.len() > 2 {
            self.debug.generation = self.widget.model.generation();
            self.debug.render(layout[2], buf);
        }
    }
}

pub(crate) fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Fixed-size area centered in `r`, clipped to it.
pub(crate) fn centered_area(r: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}
