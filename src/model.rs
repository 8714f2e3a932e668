//! The table model: adapts a polars `DataFrame` to the row/column/cell
//! interface the table view reads.
//!
//! The model owns the dataset and its row labels (the index). Every mutation
//! goes through [`TableModel::install`], which bumps [`TableModel::generation`];
//! views compare generations to know when to drop cursor, selection and scroll
//! state derived from the previous dataset.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

use crate::missing::{missing_count, normalize_missing};

/// Name used for the default (range) index when it has to be materialized as a column.
pub const DEFAULT_INDEX_NAME: &str = "index";

/// Rows and columns of the dataset shown when no file is opened.
pub const EMPTY_ROWS: usize = 10;
pub const EMPTY_COLUMNS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAxis {
    /// Column headers
    Horizontal,
    /// Row labels
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub index_name: Option<String>,
    pub index_dtype: String,
    pub estimated_bytes: usize,
}

pub struct TableModel {
    df: DataFrame,
    /// Row labels; always as long as `df` is tall.
    index: Column,
    /// Set when a data column was promoted to the index.
    index_name: Option<String>,
    generation: u64,
}

impl TableModel {
    pub fn new(df: DataFrame) -> Result<Self> {
        let df = normalize_missing(&df)?;
        let index = range_index(df.height());
        Ok(Self {
            df,
            index,
            index_name: None,
            generation: 0,
        })
    }

    /// 10 rows by 4 all-missing text columns named `a`..`d`.
    pub fn empty() -> Result<Self> {
        let columns: Vec<Column> = EMPTY_COLUMNS
            .iter()
            .map(|name| Column::full_null((*name).into(), EMPTY_ROWS, &DataType::String))
            .collect();
        Self::new(DataFrame::new(columns)?)
    }

    pub fn data_frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn index(&self) -> &Column {
        &self.index
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Incremented on every dataset mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn column_name(&self, index: usize) -> Option<String> {
        self.df
            .get_columns()
            .get(index)
            .map(|c| c.name().to_string())
    }

    /// Display string for a cell. Missing values render as an empty string.
    pub fn value_at(&self, row: usize, col: usize) -> String {
        self.df
            .get_columns()
            .get(col)
            .and_then(|c| c.get(row).ok())
            .map(|v| format_value(&v))
            .unwrap_or_default()
    }

    pub fn header_label(&self, axis: HeaderAxis, index: usize) -> String {
        match axis {
            HeaderAxis::Horizontal => self.column_name(index).unwrap_or_default(),
            HeaderAxis::Vertical => self
                .index
                .get(index)
                .map(|v| format_value(&v))
                .unwrap_or_default(),
        }
    }

    /// Stable sort by one column, missing values last. Row labels move with their rows.
    pub fn sort_by_column(&mut self, index: usize, ascending: bool) -> Result<()> {
        let name = self
            .column_name(index)
            .ok_or_else(|| eyre!("No column at position {}", index))?;
        let options = SortMultipleOptions::default()
            .with_order_descending(!ascending)
            .with_nulls_last(true)
            .with_maintain_order(true);
        self.transform(|df, _| {
            Ok(df
                .clone()
                .lazy()
                .sort_by_exprs(vec![col(name.as_str())], options)
                .collect()?)
        })
    }

    /// Replace the dataset wholesale; the index is reset to a range index.
    pub fn replace(&mut self, df: DataFrame) -> Result<()> {
        let index = range_index(df.height());
        self.index_name = None;
        self.install(df, index)
    }

    /// Apply `f` to the dataset with the index attached as an extra column named
    /// by the second argument. `f` must keep that column; it is detached again
    /// afterwards so row labels follow any row removal or reordering.
    pub fn transform<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&DataFrame, &str) -> Result<DataFrame>,
    {
        let key = hidden_index_name(&self.df);
        let framed = self
            .df
            .hstack(&[self.index.clone().with_name(key.as_str().into())])?;
        let out = f(&framed, &key)?;
        let index = out
            .column(&key)
            .map_err(|_| eyre!("Row labels were dropped by the operation"))?
            .clone()
            .with_name(self.index_label_name().into());
        let df = out.drop(&key)?;
        self.install(df, index)
    }

    /// Promote a column to the row index. The column leaves the table.
    pub fn set_index(&mut self, col: usize) -> Result<()> {
        let name = self
            .column_name(col)
            .ok_or_else(|| eyre!("No column at position {}", col))?;
        let index = self.df.column(&name)?.clone();
        let df = self.df.drop(&name)?;
        self.index_name = Some(name);
        self.install(df, index)
    }

    /// Replace the dataset and promote column `col` of the new frame to the index.
    /// Nothing changes when `col` does not exist.
    pub fn replace_indexed(&mut self, df: DataFrame, col: usize) -> Result<()> {
        let name = df
            .get_column_names()
            .get(col)
            .map(|n| n.to_string())
            .ok_or_else(|| eyre!("No column at position {}", col))?;
        let index = df.column(&name)?.clone();
        let df = df.drop(&name)?;
        self.install(df, index)?;
        self.index_name = Some(name);
        Ok(())
    }

    /// Move a named index back into the table as the first column.
    pub fn reset_index(&mut self) -> Result<()> {
        let Some(name) = self.index_name.clone() else {
            return Ok(());
        };
        if self.df.get_column_index(&name).is_some() {
            return Err(eyre!(
                "Cannot reset index: a column named '{}' already exists",
                name
            ));
        }
        let mut df = self.df.clone();
        df.insert_column(0, self.index.clone().with_name(name.as_str().into()))?;
        let index = range_index(df.height());
        self.index_name = None;
        self.install(df, index)
    }

    /// Sub-dataset made of the given row positions, in the given order.
    pub fn rows_frame(&self, rows: &[usize]) -> Result<DataFrame> {
        if let Some(bad) = rows.iter().find(|&&r| r >= self.row_count()) {
            return Err(eyre!(
                "Row {} is out of range ({} rows)",
                bad,
                self.row_count()
            ));
        }
        let idx = IdxCa::from_vec(
            PlSmallStr::from_static("rows"),
            rows.iter().map(|&r| r as IdxSize).collect(),
        );
        Ok(self.df.take(&idx)?)
    }

    /// Append rows with the same column names. New rows continue a range
    /// index, or get missing labels under a named index.
    pub fn append_rows(&mut self, rows: &DataFrame) -> Result<()> {
        if rows.get_column_names() != self.df.get_column_names() {
            return Err(eyre!(
                "Pasted columns ({}) do not match the table ({})",
                join_names(rows),
                join_names(&self.df)
            ));
        }
        let n = rows.height();
        let label_name: PlSmallStr = self.index_label_name().into();
        let new_labels: Series = if self.index_name.is_none() {
            let start = self
                .index
                .as_materialized_series()
                .max::<i64>()?
                .map_or(0, |m| m + 1);
            Series::new(label_name, (start..start + n as i64).collect::<Vec<i64>>())
        } else {
            Series::full_null(label_name, n, self.index.dtype())
        };
        let mut index = self.index.as_materialized_series().clone();
        index.append(&new_labels)?;

        let union = UnionArgs {
            to_supertypes: true,
            ..Default::default()
        };
        let df = concat([self.df.clone().lazy(), rows.clone().lazy()], union)?.collect()?;
        self.install(df, index.into())
    }

    /// Dataset for writing out: a named index becomes the first column, a range index is left out.
    pub fn export_frame(&self) -> Result<DataFrame> {
        let mut df = self.df.clone();
        if let Some(name) = &self.index_name {
            if df.get_column_index(name).is_none() {
                df.insert_column(0, self.index.clone().with_name(name.as_str().into()))?;
            }
        }
        Ok(df)
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        let mut columns = Vec::with_capacity(self.df.width());
        for column in self.df.get_columns() {
            columns.push(ColumnSummary {
                name: column.name().to_string(),
                dtype: column.dtype().to_string(),
                missing: missing_count(column)?,
            });
        }
        Ok(DatasetSummary {
            rows: self.df.height(),
            columns,
            index_name: self.index_name.clone(),
            index_dtype: self.index.dtype().to_string(),
            estimated_bytes: self.df.estimated_size(),
        })
    }

    fn index_label_name(&self) -> String {
        self.index_name
            .clone()
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string())
    }

    fn install(&mut self, df: DataFrame, index: Column) -> Result<()> {
        // A frame built from no columns may report height 0; the labels still count the rows
        let df = if df.width() == 0 {
            DataFrame::empty_with_height(index.len())
        } else {
            df
        };
        if index.len() != df.height() {
            return Err(eyre!(
                "Row labels ({}) do not match the number of rows ({})",
                index.len(),
                df.height()
            ));
        }
        self.df = normalize_missing(&df)?;
        self.index = index;
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }
}

/// Display string for a single value: missing → "", strings without quotes.
pub fn format_value(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) if v.is_nan() => String::new(),
        AnyValue::Float32(v) if v.is_nan() => String::new(),
        v => v.str_value().to_string(),
    }
}

fn range_index(len: usize) -> Column {
    Series::new(
        PlSmallStr::from_static(DEFAULT_INDEX_NAME),
        (0..len as i64).collect::<Vec<i64>>(),
    )
    .into()
}

/// A column name guaranteed not to clash with any data column.
fn hidden_index_name(df: &DataFrame) -> String {
    let mut name = String::from("__index__");
    while df.get_column_index(&name).is_some() {
        name.push('_');
    }
    name
}

fn join_names(df: &DataFrame) -> String {
    df.get_column_names()
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
