//! The table with its toolbar, clipboard and the dataset operations.
//!
//! Every operation that needs parameters opens an [`OptionsDialog`]; accepting
//! it applies the operation to the [`TableModel`], which replaces its dataset
//! and bumps its generation. The table view resets itself on the next render.

use std::path::{Path, PathBuf};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dftable_cli::FileFormat;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{StatefulWidget, Widget};

use crate::chart_data::{prepare_plot_data, PlotSeries};
use crate::clean::{clean_data, CleanOptions};
use crate::clipboard::Clipboard;
use crate::config::{AppConfig, DisplayConfig, Theme};
use crate::convert::{convert_numeric, ConvertOptions};
use crate::file_io::{self, ImportOptions};
use crate::model::{DatasetSummary, TableModel};
use crate::pivot::{pivot, PivotSpec};
use crate::widgets::chart::PlotView;
use crate::widgets::datatable::{DataTable, DataTableState, TableAction};
use crate::widgets::dialog::{DialogOutcome, OptionSpec, OptionValues, OptionsDialog, OptionsDialogView};
use crate::widgets::info::{DataTableInfo, InfoModal};
use crate::widgets::menu::{CellCommand, ContextMenu, ContextMenuView, HeaderCommand, MenuOutcome};
use crate::widgets::toolbar::{Toolbar, ToolbarCommand, ToolbarView, TOOLBAR_WIDTH};
use crate::{centered_area, centered_rect};

const MAX_CELL_PADDING: i64 = 4;
const DIALOG_WIDTH: u16 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Table,
    Toolbar,
}

/// Operation waiting for its dialog to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOp {
    Load,
    Save,
    Import,
    ImportExcel,
    Clean,
    Convert,
    Pivot,
    Preferences,
}

#[derive(Default)]
enum Overlay {
    #[default]
    None,
    Dialog(DialogOp, OptionsDialog),
    HeaderMenu(ContextMenu<HeaderCommand>),
    CellMenu(ContextMenu<CellCommand>),
    Info(DatasetSummary),
    Plot(Vec<PlotSeries>),
}

pub struct DataFrameWidget {
    pub model: TableModel,
    pub table: DataTableState,
    pub toolbar: Toolbar,
    pub clipboard: Clipboard,
    pub display: DisplayConfig,
    focus: Focus,
    overlay: Overlay,
    info: InfoModal,
    path: Option<PathBuf>,
    import_options: ImportOptions,
    clean_options: CleanOptions,
    convert_options: ConvertOptions,
    last_action: String,
}

impl DataFrameWidget {
    /// Starts with the default empty dataset.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut import_options = ImportOptions::default();
        if let Some(delimiter) = config.file_loading.delimiter {
            import_options.delimiter = delimiter;
        }
        if let Some(has_header) = config.file_loading.has_header {
            import_options.has_header = has_header;
        }
        if let Some(skip_rows) = config.file_loading.skip_rows {
            import_options.skip_rows = skip_rows;
        }
        Ok(Self {
            model: TableModel::empty()?,
            table: DataTableState::new(),
            toolbar: Toolbar::new(),
            clipboard: Clipboard::new(),
            display: config.display.clone(),
            focus: Focus::Table,
            overlay: Overlay::None,
            info: InfoModal::new(),
            path: None,
            import_options,
            clean_options: CleanOptions::from_config(&config.clean)?,
            convert_options: ConvertOptions::default(),
            last_action: String::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn has_overlay(&self) -> bool {
        !matches!(self.overlay, Overlay::None)
    }

    /// Dialog waiting for input, if any.
    pub fn dialog(&self) -> Option<(DialogOp, &OptionsDialog)> {
        match &self.overlay {
            Overlay::Dialog(op, dialog) => Some((*op, dialog)),
            _ => None,
        }
    }

    pub fn plot_series(&self) -> Option<&[PlotSeries]> {
        match &self.overlay {
            Overlay::Plot(series) => Some(series),
            _ => None,
        }
    }

    pub fn info_summary(&self) -> Option<&DatasetSummary> {
        match &self.overlay {
            Overlay::Info(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    pub fn last_action(&self) -> &str {
        &self.last_action
    }

    fn record(&mut self, action: impl Into<String>) {
        self.last_action = action.into();
    }

    /// Key hints for the current context.
    pub fn controls(&self) -> Option<Vec<(&'static str, &'static str)>> {
        match &self.overlay {
            Overlay::None if self.focus == Focus::Toolbar => Some(vec![
                ("↑↓", "Select"),
                ("Enter", "Run"),
                ("Tab", "Table"),
                ("q", "Quit"),
            ]),
            Overlay::None => None,
            Overlay::Dialog(..) => Some(vec![
                ("↑↓", "Field"),
                ("←→", "Change"),
                ("Enter", "OK"),
                ("Esc", "Cancel"),
            ]),
            Overlay::HeaderMenu(_) | Overlay::CellMenu(_) => {
                Some(vec![("↑↓", "Select"), ("Enter", "Run"), ("Esc", "Close")])
            }
            Overlay::Info(_) | Overlay::Plot(_) => Some(vec![("Esc", "Close")]),
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<()> {
        match std::mem::take(&mut self.overlay) {
            Overlay::None => self.handle_base_key(event),
            Overlay::Dialog(op, mut dialog) => match dialog.handle_key(event) {
                DialogOutcome::Pending => {
                    self.overlay = Overlay::Dialog(op, dialog);
                    Ok(())
                }
                DialogOutcome::Cancelled => Ok(()),
                DialogOutcome::Accepted(values) => self.apply_dialog(op, &values),
            },
            Overlay::HeaderMenu(mut menu) => match menu.handle_key(event) {
                MenuOutcome::Pending => {
                    self.overlay = Overlay::HeaderMenu(menu);
                    Ok(())
                }
                MenuOutcome::Closed => Ok(()),
                MenuOutcome::Chosen(cmd) => self.header_command(cmd),
            },
            Overlay::CellMenu(mut menu) => match menu.handle_key(event) {
                MenuOutcome::Pending => {
                    self.overlay = Overlay::CellMenu(menu);
                    Ok(())
                }
                MenuOutcome::Closed => Ok(()),
                MenuOutcome::Chosen(cmd) => self.cell_command(cmd),
            },
            Overlay::Info(summary) => {
                if self.info.handle_key(event, summary.columns.len()) {
                    self.overlay = Overlay::Info(summary);
                }
                Ok(())
            }
            Overlay::Plot(series) => {
                if !matches!(
                    event.code,
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('P')
                ) {
                    self.overlay = Overlay::Plot(series);
                }
                Ok(())
            }
        }
    }

    fn handle_base_key(&mut self, event: &KeyEvent) -> Result<()> {
        if event.code == KeyCode::Tab || event.code == KeyCode::BackTab {
            self.set_focus(match self.focus {
                Focus::Table if self.display.toolbar => Focus::Toolbar,
                _ => Focus::Table,
            });
            return Ok(());
        }

        if self.focus == Focus::Toolbar {
            if event.code == KeyCode::Esc {
                self.set_focus(Focus::Table);
                return Ok(());
            }
            return match self.toolbar.handle_key(event) {
                Some(cmd) => self.run_command(cmd),
                None => Ok(()),
            };
        }

        if let KeyCode::Char(c) = event.code {
            if !event.modifiers.contains(KeyModifiers::CONTROL) {
                if let Some(cmd) = ToolbarCommand::from_key(c) {
                    return self.run_command(cmd);
                }
            }
        }

        match self.table.handle_key(event, &self.model) {
            TableAction::None => {}
            TableAction::OpenHeaderMenu => {
                if let Some(name) = self.model.column_name(self.table.cursor_col) {
                    self.overlay = Overlay::HeaderMenu(ContextMenu::header(&name));
                }
            }
            TableAction::OpenCellMenu => self.overlay = Overlay::CellMenu(ContextMenu::cell()),
        }
        Ok(())
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.toolbar.focused = focus == Focus::Toolbar;
    }

    fn open_dialog(&mut self, op: DialogOp, title: &str, specs: Vec<OptionSpec>) {
        self.overlay = Overlay::Dialog(op, OptionsDialog::new(title, specs));
    }

    fn path_text(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    pub fn run_command(&mut self, cmd: ToolbarCommand) -> Result<()> {
        match cmd {
            ToolbarCommand::Load => {
                let path = self.path_text();
                self.open_dialog(
                    DialogOp::Load,
                    "Load",
                    vec![OptionSpec::entry("path", "File", &path)
                        .with_tooltip("csv, tsv, parquet, arrow, json, jsonl, xlsx, xls, ods")],
                );
            }
            ToolbarCommand::Save => {
                let path = self.path_text();
                self.open_dialog(
                    DialogOp::Save,
                    "Save",
                    vec![OptionSpec::entry("path", "File", &path)
                        .with_tooltip("format from extension: csv, tsv, parquet, arrow, json, jsonl")],
                );
            }
            ToolbarCommand::ImportExcel => self.open_dialog(
                DialogOp::ImportExcel,
                "Import Excel",
                vec![
                    OptionSpec::entry("path", "File", ""),
                    OptionSpec::entry("sheet", "Sheet", "")
                        .with_tooltip("sheet name or 0-based position; empty for the first"),
                ],
            ),
            ToolbarCommand::Copy => self.copy()?,
            ToolbarCommand::Paste => self.paste()?,
            ToolbarCommand::Plot => self.plot()?,
            ToolbarCommand::Pivot => {
                let names = self.model.column_names();
                if names.len() < 3 {
                    return Err(eyre!("Pivot needs at least three columns"));
                }
                self.open_dialog(DialogOp::Pivot, "Pivot", PivotSpec::option_specs(&names));
            }
            ToolbarCommand::Clean => {
                let specs = self.clean_options.option_specs();
                self.open_dialog(DialogOp::Clean, "Clean Data", specs);
            }
            ToolbarCommand::Convert => {
                let specs = self.convert_options.option_specs();
                self.open_dialog(DialogOp::Convert, "Convert Numeric", specs);
            }
            ToolbarCommand::Info => self.show_info()?,
        }
        Ok(())
    }

    pub fn header_command(&mut self, cmd: HeaderCommand) -> Result<()> {
        let col = self.table.cursor_col;
        match cmd {
            HeaderCommand::SetIndex => {
                self.model.set_index(col)?;
                self.record("set_index");
            }
            HeaderCommand::SortAscending => {
                self.model.sort_by_column(col, true)?;
                self.record("sort_ascending");
            }
            HeaderCommand::SortDescending => {
                self.model.sort_by_column(col, false)?;
                self.record("sort_descending");
            }
            HeaderCommand::ResetIndex => {
                self.model.reset_index()?;
                self.record("reset_index");
            }
        }
        Ok(())
    }

    pub fn cell_command(&mut self, cmd: CellCommand) -> Result<()> {
        let rows = self.table.target_rows(self.model.row_count());
        match cmd {
            CellCommand::Copy => self.copy()?,
            CellCommand::SetColor => {
                self.table.cycle_row_color(&rows);
                self.record("set_color");
            }
            CellCommand::ClearColor => {
                self.table.clear_row_color(&rows);
                self.record("clear_color");
            }
            CellCommand::Import => {
                let specs = self.import_options.option_specs(&self.path_text());
                self.open_dialog(DialogOp::Import, "Import Text", specs);
            }
            CellCommand::Preferences => self.open_dialog(
                DialogOp::Preferences,
                "Preferences",
                vec![
                    OptionSpec::check("rowlabels", "Row labels", self.display.row_labels),
                    OptionSpec::check("alternaterows", "Alternate rows", self.display.alternate_rows),
                    OptionSpec::spin(
                        "cellpadding",
                        "Cell padding",
                        0,
                        MAX_CELL_PADDING,
                        self.display.cell_padding as i64,
                    ),
                    OptionSpec::check("toolbar", "Toolbar", self.display.toolbar),
                ],
            ),
        }
        Ok(())
    }

    pub fn apply_dialog(&mut self, op: DialogOp, values: &OptionValues) -> Result<()> {
        match op {
            DialogOp::Load => {
                let path = required_path(values)?;
                self.load(&path, None)
            }
            DialogOp::Save => {
                let path = required_path(values)?;
                self.save(&path)
            }
            DialogOp::Import => {
                let path = required_path(values)?;
                let opts = ImportOptions::from_values(values)?;
                self.import(&path, opts)
            }
            DialogOp::ImportExcel => {
                let path = required_path(values)?;
                let sheet = values.text("sheet").trim();
                let sheet = (!sheet.is_empty()).then_some(sheet);
                let df = file_io::load_excel(&path, sheet)?;
                self.replace(df, Some(path), "import_excel")
            }
            DialogOp::Clean => {
                let opts = CleanOptions::from_values(values)?;
                self.clean(&opts)?;
                self.clean_options = opts;
                Ok(())
            }
            DialogOp::Convert => {
                let opts = ConvertOptions::from_values(values)?;
                self.convert(&opts)?;
                self.convert_options = opts;
                Ok(())
            }
            DialogOp::Pivot => self.pivot(&PivotSpec::from_values(values)?),
            DialogOp::Preferences => {
                self.display.row_labels = values.flag("rowlabels");
                self.display.alternate_rows = values.flag("alternaterows");
                self.display.cell_padding =
                    values.number("cellpadding").clamp(0, MAX_CELL_PADDING) as u16;
                self.display.toolbar = values.flag("toolbar");
                if !self.display.toolbar {
                    self.set_focus(Focus::Table);
                }
                self.record("preferences");
                Ok(())
            }
        }
    }

    fn replace(&mut self, df: polars::prelude::DataFrame, path: Option<PathBuf>, action: &str) -> Result<()> {
        self.model.replace(df)?;
        if path.is_some() {
            self.path = path;
        }
        self.record(action);
        Ok(())
    }

    /// Read a file chosen by extension (or `format`) and show it.
    pub fn load(&mut self, path: &Path, format: Option<FileFormat>) -> Result<()> {
        let df = file_io::load(path, format, &self.import_options)?;
        self.replace(df, Some(path.to_path_buf()), "load")
    }

    /// Read a delimited text file with explicit options; they become the new defaults.
    pub fn import(&mut self, path: &Path, opts: ImportOptions) -> Result<()> {
        let df = file_io::import_delimited(path, &opts)?;
        self.import_options = ImportOptions {
            excel_sheet: self.import_options.excel_sheet.clone(),
            ..opts
        };
        self.replace(df, Some(path.to_path_buf()), "import")
    }

    pub fn set_import_options(&mut self, opts: ImportOptions) {
        self.import_options = opts;
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let mut df = self.model.export_frame()?;
        file_io::save(&mut df, path)?;
        self.path = Some(path.to_path_buf());
        self.record("save");
        Ok(())
    }

    pub fn clean(&mut self, opts: &CleanOptions) -> Result<()> {
        self.model
            .transform(|df, key| clean_data(df, Some(key), opts))?;
        self.record("clean");
        Ok(())
    }

    /// Convert all columns, or only the selected ones (cursor column if none).
    pub fn convert(&mut self, opts: &ConvertOptions) -> Result<()> {
        let columns: Vec<String> = if opts.selected_only {
            let mut positions = self.table.selected_columns();
            if positions.is_empty() {
                positions.push(self.table.cursor_col);
            }
            positions
                .into_iter()
                .filter_map(|i| self.model.column_name(i))
                .collect()
        } else {
            self.model.column_names()
        };
        self.model
            .transform(|df, _| convert_numeric(df, &columns, opts))?;
        self.record("convert");
        Ok(())
    }

    /// The pivot result's index column becomes the row index.
    pub fn pivot(&mut self, spec: &PivotSpec) -> Result<()> {
        let df = pivot(self.model.data_frame(), spec)?;
        self.model.replace_indexed(df, 0)?;
        self.record("pivot");
        Ok(())
    }

    /// Copy the selected rows (cursor row if none) to the clipboard.
    pub fn copy(&mut self) -> Result<()> {
        let rows = self.table.target_rows(self.model.row_count());
        if rows.is_empty() {
            return Err(eyre!("Nothing to copy: the table has no rows"));
        }
        let df = self.model.rows_frame(&rows)?;
        self.clipboard.copy(df);
        self.record(format!("copy {} rows", rows.len()));
        Ok(())
    }

    /// Append the clipboard rows to the dataset.
    pub fn paste(&mut self) -> Result<()> {
        self.model.append_rows(self.clipboard.paste_frame()?)?;
        self.record(format!("paste {} rows", self.clipboard.row_count()));
        Ok(())
    }

    /// Plot the selected numeric columns, or all numeric columns.
    pub fn plot(&mut self) -> Result<()> {
        let names: Vec<String> = self
            .table
            .selected_columns()
            .into_iter()
            .filter_map(|i| self.model.column_name(i))
            .collect();
        let series = prepare_plot_data(self.model.data_frame(), &names)?;
        self.overlay = Overlay::Plot(series);
        self.record("plot");
        Ok(())
    }

    pub fn show_info(&mut self) -> Result<()> {
        let summary = self.model.summary()?;
        self.info.open();
        self.overlay = Overlay::Info(summary);
        Ok(())
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let (table_area, toolbar_area) = if self.display.toolbar {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Fill(1), Constraint::Length(TOOLBAR_WIDTH)])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        };

        let alternate = if self.display.alternate_rows {
            theme.get_optional("alternate_row")
        } else {
            None
        };
        DataTable::new(&self.model)
            .with_colors(
                theme.get("table_header_bg"),
                theme.get("table_header"),
                theme.get("row_labels"),
                theme.get("selection"),
            )
            .with_cell_padding(self.display.cell_padding)
            .with_alternate_row_bg(alternate)
            .with_row_labels(self.display.row_labels)
            .render(table_area, buf, &mut self.table);

        if let Some(toolbar_area) = toolbar_area {
            ToolbarView::new(&self.toolbar, theme.get("modal_border"), theme.get("primary"))
                .with_dimmed(self.has_overlay())
                .render(toolbar_area, buf);
        }

        let border = theme.get("modal_border");
        match &self.overlay {
            Overlay::None => {}
            Overlay::Dialog(_, dialog) => {
                let view = OptionsDialogView::new(dialog, border, theme.get("modal_border_active"));
                let dialog_area = centered_area(area, DIALOG_WIDTH, view.required_height());
                view.render(dialog_area, buf);
            }
            Overlay::HeaderMenu(menu) => {
                let view = ContextMenuView::new(menu, border);
                let menu_area = view.area((table_area.x + 2, table_area.y + 1), area);
                view.render(menu_area, buf);
            }
            Overlay::CellMenu(menu) => {
                let view = ContextMenuView::new(menu, border);
                let row = self.table.cursor_row.saturating_sub(self.table.start_row) as u16;
                let menu_area = view.area((table_area.x + 4, table_area.y + 2 + row), area);
                view.render(menu_area, buf);
            }
            Overlay::Info(summary) => {
                DataTableInfo::new(summary, self.path.as_deref(), &mut self.info, border)
                    .render(centered_rect(area, 70, 80), buf);
            }
            Overlay::Plot(series) => {
                PlotView::new(series, border, theme.get("text_primary"))
                    .render(centered_rect(area, 90, 85), buf);
            }
        }
    }
}

fn required_path(values: &OptionValues) -> Result<PathBuf> {
    let path = values.text("path").trim();
    if path.is_empty() {
        return Err(eyre!("No file given"));
    }
    Ok(PathBuf::from(path))
}
