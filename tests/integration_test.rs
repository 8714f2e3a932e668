use crossterm::event::KeyCode;
use dftable::model::HeaderAxis;
use dftable::{AppEvent, FileFormat, OpenOptions};
use polars::prelude::*;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use tempfile::TempDir;

mod common;
use common::{new_app, open, press, press_ctrl, prices, write_csv};

#[test]
fn test_app_starts_with_empty_table() {
    let app = new_app();
    assert_eq!(app.widget.model.row_count(), 10);
    assert_eq!(app.widget.model.column_count(), 4);
    assert_eq!(app.widget.model.value_at(0, 0), "");
    assert!(app.error_message().is_none());
}

#[test]
fn test_open_csv_and_sort_from_header_menu() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());
    assert!(!app.is_loading());
    assert_eq!(app.widget.model.row_count(), 5);
    assert_eq!(app.widget.path(), Some(path.as_path()));

    // cursor to "price", header menu, "Sort Ascending"
    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('m'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);

    let model = &app.widget.model;
    assert_eq!(model.value_at(0, 0), "fig");
    assert_eq!(model.value_at(0, 1), "1.25");
    assert_eq!(model.header_label(HeaderAxis::Vertical, 0), "2");
    // missing prices sort last and render empty
    assert_eq!(model.value_at(3, 1), "");
    assert_eq!(model.value_at(4, 1), "");
    assert_eq!(model.row_count(), 5);
    assert_eq!(model.column_count(), 3);
}

#[test]
fn test_clean_dialog_drops_rows_with_missing_values() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char('x'));
    for _ in 0..4 {
        press(&mut app, KeyCode::Down);
    }
    press(&mut app, KeyCode::Char(' ')); // droprows
    press(&mut app, KeyCode::Enter);

    let model = &app.widget.model;
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.value_at(0, 0), "pear");
    assert_eq!(model.value_at(1, 0), "kiwi");
    assert_eq!(model.header_label(HeaderAxis::Vertical, 1), "3");
}

#[test]
fn test_convert_dialog_strips_currency() {
    let dir = TempDir::new().unwrap();
    let mut df = df!(
        "amount" => ["$1,200", "$30", "(4)"],
        "qty" => [1i64, 2, 3],
    )
    .unwrap();
    let path = write_csv(dir.path(), "amounts.csv", &mut df);
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char(' ')); // convert currency
    press(&mut app, KeyCode::Enter);

    let df = app.widget.model.data_frame();
    let amount: Vec<Option<i64>> = df
        .column("amount")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(amount, vec![Some(1200), Some(30), Some(-4)]);
}

#[test]
fn test_copy_and_paste_with_keys() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char('y'));
    assert_eq!(app.widget.clipboard.row_count(), 1);
    press(&mut app, KeyCode::Char('p'));

    let model = &app.widget.model;
    assert_eq!(model.row_count(), 6);
    assert_eq!(model.value_at(5, 0), "pear");
    assert_eq!(model.header_label(HeaderAxis::Vertical, 5), "5");
}

#[test]
fn test_controls_bar_counts_copied_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char('y'));

    let area = Rect::new(0, 0, 100, 20);
    let mut buf = Buffer::empty(area);
    (&mut app).render(area, &mut buf);
    let bottom: String = (0..area.width)
        .map(|x| buf[(x, 19)].symbol().to_string())
        .collect();
    assert!(bottom.contains("2 copied | 5 x 3"), "got: {}", bottom);
}

#[test]
fn test_paste_without_copy_shows_error_modal() {
    let mut app = new_app();
    press(&mut app, KeyCode::Char('p'));
    let message = app.error_message().unwrap();
    assert!(message.contains("Clipboard is empty"));

    // the modal swallows keys until dismissed
    assert!(press(&mut app, KeyCode::Char('q')).is_none());
    press(&mut app, KeyCode::Esc);
    assert!(app.error_message().is_none());
}

#[test]
fn test_missing_file_keeps_current_table() {
    let dir = TempDir::new().unwrap();
    let mut app = new_app();
    open(&mut app, &dir.path().join("missing.csv"), OpenOptions::default());
    assert!(app.error_message().is_some());
    assert!(!app.is_loading());
    assert_eq!(app.widget.model.row_count(), 10);
}

#[test]
fn test_semicolon_delimiter_from_open_options() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("semi.csv");
    std::fs::write(&path, "a;b\n1;x\n2;y\n").unwrap();
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::new().with_delimiter(b';'));
    assert_eq!(app.widget.model.column_names(), vec!["a", "b"]);
    assert_eq!(app.widget.model.value_at(1, 1), "y");
}

#[test]
fn test_format_override_reads_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.dat");
    std::fs::write(&path, "a,b\n1,x\n").unwrap();

    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());
    assert!(app.error_message().is_some());
    press(&mut app, KeyCode::Esc);

    open(&mut app, &path, OpenOptions::new().with_format(FileFormat::Csv));
    assert!(app.error_message().is_none());
    assert_eq!(app.widget.model.row_count(), 1);
    assert_eq!(app.widget.model.value_at(0, 1), "x");
}

#[test]
fn test_pivot_dialog_uses_first_three_columns() {
    let dir = TempDir::new().unwrap();
    let mut df = df!(
        "store" => ["a", "a", "b", "b"],
        "month" => ["jan", "feb", "jan", "feb"],
        "amount" => [1.5, 2.5, 3.5, 4.5],
    )
    .unwrap();
    let path = write_csv(dir.path(), "sales.csv", &mut df);
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char('t'));
    press(&mut app, KeyCode::Enter);

    let model = &app.widget.model;
    assert_eq!(model.index_name(), Some("store"));
    assert_eq!(model.column_names(), vec!["jan", "feb"]);
    assert_eq!(model.header_label(HeaderAxis::Vertical, 1), "b");
    assert_eq!(model.value_at(1, 1), "4.5");
}

#[test]
fn test_plot_selected_column() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('v'));
    press(&mut app, KeyCode::Char('P'));
    let series = app.widget.plot_series().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, "price");
    assert_eq!(series[0].points.len(), 3);

    press(&mut app, KeyCode::Esc);
    assert!(app.widget.plot_series().is_none());
}

#[test]
fn test_quit_and_help_keys() {
    let mut app = new_app();
    assert!(press(&mut app, KeyCode::Char('?')).is_none());
    // q closes help first
    assert!(press(&mut app, KeyCode::Char('q')).is_none());
    assert!(matches!(
        press(&mut app, KeyCode::Char('q')),
        Some(AppEvent::Exit)
    ));
    assert!(matches!(press_ctrl(&mut app, 'c'), Some(AppEvent::Exit)));
}

#[test]
fn test_render_shows_headers_and_controls() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "prices.csv", &mut prices());
    let mut app = new_app();
    open(&mut app, &path, OpenOptions::default());

    let area = Rect::new(0, 0, 100, 20);
    let mut buf = Buffer::empty(area);
    (&mut app).render(area, &mut buf);

    let line = |y: u16| -> String {
        (0..area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    };
    assert!(line(0).contains("item"));
    assert!(line(0).contains("price"));
    assert!(line(19).contains("5 x 3"));
}
