#![allow(dead_code)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dftable::{App, AppEvent, OpenOptions};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Write `df` as CSV into `dir` and return the file path.
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Small dataset with missing values in two columns.
pub fn prices() -> DataFrame {
    df!(
        "item" => ["pear", "apple", "fig", "kiwi", "plum"],
        "price" => [Some(3.5), None, Some(1.25), Some(2.0), None],
        "stock" => [Some(10i64), Some(4), None, Some(7), Some(1)],
    )
    .unwrap()
}

pub fn new_app() -> App {
    App::new().unwrap()
}

/// Send `Open` and every follow-up event until the app is idle.
pub fn open(app: &mut App, path: &Path, opts: OpenOptions) {
    let mut next = app.event(&AppEvent::Open(path.to_path_buf(), opts));
    while let Some(event) = next {
        next = app.event(&event);
    }
}

pub fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

pub fn press_ctrl(app: &mut App, c: char) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(
        KeyCode::Char(c),
        KeyModifiers::CONTROL,
    )))
}
