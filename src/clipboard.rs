//! In-app clipboard for copied rows.
//!
//! Holds the copied rows as a `DataFrame`; paste appends them to the table.
//! The controls bar shows how many rows are held.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

#[derive(Default)]
pub struct Clipboard {
    frame: Option<DataFrame>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, df: DataFrame) {
        self.frame = Some(df);
    }

    /// Rows to paste; fails when nothing was copied yet.
    pub fn paste_frame(&self) -> Result<&DataFrame> {
        self.frame
            .as_ref()
            .ok_or_else(|| eyre!("Clipboard is empty: copy some rows first"))
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }

    pub fn row_count(&self) -> usize {
        self.frame.as_ref().map_or(0, |df| df.height())
    }
}
