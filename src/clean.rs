//! Clean-data operation: drop/fill missing values, deduplicate and round.
//!
//! Steps run in a fixed order: drop columns, drop rows, fill, drop duplicate
//! rows, drop duplicate columns, round. The row-label column named by
//! `index_key` rides along with the rows but never takes part in any decision.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

use crate::config::CleanConfig;
use crate::convert::float_to_i64;
use crate::missing::{missing_count, missing_mask, normalize_missing};
use crate::widgets::dialog::{OptionSpec, OptionValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMethod {
    #[default]
    None,
    Scalar,
    Forward,
    Backward,
    Interpolate,
}

impl FillMethod {
    /// Dialog labels, in dialog order.
    pub const LABELS: [&'static str; 5] = ["fill scalar", "", "ffill", "bfill", "interpolate"];

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "" => Ok(FillMethod::None),
            "fill scalar" => Ok(FillMethod::Scalar),
            "ffill" => Ok(FillMethod::Forward),
            "bfill" => Ok(FillMethod::Backward),
            "interpolate" => Ok(FillMethod::Interpolate),
            other => Err(eyre!("Unknown fill method: '{}'", other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FillMethod::None => "",
            FillMethod::Scalar => "fill scalar",
            FillMethod::Forward => "ffill",
            FillMethod::Backward => "bfill",
            FillMethod::Interpolate => "interpolate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropHow {
    /// Drop when at least one value is missing
    #[default]
    Any,
    /// Drop when every value is missing
    All,
}

impl DropHow {
    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "any" | "" => Ok(DropHow::Any),
            "all" => Ok(DropHow::All),
            other => Err(eyre!("Unknown drop method: '{}'", other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DropHow::Any => "any",
            DropHow::All => "all",
        }
    }

    fn matches(self, missing: usize, total: usize) -> bool {
        match self {
            DropHow::Any => missing > 0,
            DropHow::All => missing == total,
        }
    }
}

pub const SYMBOLS: [&str; 3] = ["", "-", "x"];
pub const MAX_ROUND_DECIMALS: i64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CleanOptions {
    pub method: FillMethod,
    pub symbol: String,
    /// Fill at most one consecutive gap with ffill/bfill
    pub limit: bool,
    pub drop_cols: bool,
    pub drop_rows: bool,
    pub how: DropHow,
    pub drop_duplicate_cols: bool,
    pub drop_duplicate_rows: bool,
    pub round_decimals: u32,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            method: FillMethod::None,
            symbol: String::new(),
            limit: true,
            drop_cols: false,
            drop_rows: false,
            how: DropHow::Any,
            drop_duplicate_cols: false,
            drop_duplicate_rows: false,
            round_decimals: 0,
        }
    }
}

impl CleanOptions {
    /// Defaults with the configured fill method, drop method and gap limit.
    pub fn from_config(config: &CleanConfig) -> Result<Self> {
        Ok(Self {
            method: FillMethod::from_label(&config.fill_method)?,
            how: DropHow::from_label(&config.drop_how)?,
            limit: config.limit_gaps,
            ..Self::default()
        })
    }

    pub fn option_specs(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::combo(
                "method",
                "Fill missing method",
                &FillMethod::LABELS,
                self.method.label(),
            ),
            OptionSpec::combo("symbol", "Fill empty with", &SYMBOLS, &self.symbol)
                .with_tooltip("value used by fill scalar"),
            OptionSpec::check("limit", "Limit gaps", self.limit)
                .with_tooltip("ffill/bfill fill at most one consecutive missing value"),
            OptionSpec::check("dropcols", "Drop columns with null data", self.drop_cols),
            OptionSpec::check("droprows", "Drop rows with null data", self.drop_rows),
            OptionSpec::combo("how", "Drop method", &["any", "all"], self.how.label()),
            OptionSpec::check(
                "dropduplicatecols",
                "Drop duplicate columns",
                self.drop_duplicate_cols,
            ),
            OptionSpec::check(
                "dropduplicaterows",
                "Drop duplicate rows",
                self.drop_duplicate_rows,
            ),
            OptionSpec::spin(
                "rounddecimals",
                "Round Numbers",
                0,
                MAX_ROUND_DECIMALS,
                self.round_decimals as i64,
            ),
        ]
    }

    pub fn from_values(values: &OptionValues) -> Result<Self> {
        Ok(Self {
            method: FillMethod::from_label(values.text("method"))?,
            symbol: values.text("symbol").to_string(),
            limit: values.flag("limit"),
            drop_cols: values.flag("dropcols"),
            drop_rows: values.flag("droprows"),
            how: DropHow::from_label(values.text("how"))?,
            drop_duplicate_cols: values.flag("dropduplicatecols"),
            drop_duplicate_rows: values.flag("dropduplicaterows"),
            round_decimals: values.number("rounddecimals").clamp(0, MAX_ROUND_DECIMALS) as u32,
        })
    }
}

/// Run the clean-data steps on `df`. `index_key` names the row-label column, if any.
pub fn clean_data(df: &DataFrame, index_key: Option<&str>, opts: &CleanOptions) -> Result<DataFrame> {
    let mut df = normalize_missing(df)?;

    if opts.drop_cols {
        df = drop_missing_columns(&df, index_key, opts.how)?;
    }
    if opts.drop_rows {
        df = drop_missing_rows(&df, index_key, opts.how)?;
    }
    df = match opts.method {
        FillMethod::None => df,
        FillMethod::Scalar => fill_scalar(&df, index_key, &opts.symbol)?,
        FillMethod::Forward => fill_strategy(&df, index_key, true, opts.limit)?,
        FillMethod::Backward => fill_strategy(&df, index_key, false, opts.limit)?,
        FillMethod::Interpolate => interpolate(&df, index_key)?,
    };
    if opts.drop_duplicate_rows {
        df = drop_duplicate_rows(&df, index_key)?;
    }
    if opts.drop_duplicate_cols {
        df = drop_duplicate_columns(&df, index_key)?;
    }
    if opts.round_decimals != 0 {
        df = round_floats(&df, index_key, opts.round_decimals)?;
    }
    Ok(df)
}

fn data_columns<'a>(df: &'a DataFrame, index_key: Option<&str>) -> Vec<&'a Column> {
    df.get_columns()
        .iter()
        .filter(|c| Some(c.name().as_str()) != index_key)
        .collect()
}

/// Rebuild `df` with each data column passed through `f`; the index column is kept as is.
fn map_data_columns<F>(df: &DataFrame, index_key: Option<&str>, mut f: F) -> Result<DataFrame>
where
    F: FnMut(&Column) -> Result<Column>,
{
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        if Some(column.name().as_str()) == index_key {
            columns.push(column.clone());
        } else {
            columns.push(f(column)?);
        }
    }
    Ok(DataFrame::new(columns)?)
}

pub fn drop_missing_columns(
    df: &DataFrame,
    index_key: Option<&str>,
    how: DropHow,
) -> Result<DataFrame> {
    let height = df.height();
    let mut to_drop = Vec::new();
    for column in data_columns(df, index_key) {
        if how.matches(missing_count(column)?, height) {
            to_drop.push(column.name().to_string());
        }
    }
    Ok(df.drop_many(to_drop))
}

pub fn drop_missing_rows(df: &DataFrame, index_key: Option<&str>, how: DropHow) -> Result<DataFrame> {
    let columns = data_columns(df, index_key);
    let Some((first, rest)) = columns.split_first() else {
        return Ok(df.clone());
    };
    let mut mask = missing_mask(first)?;
    for column in rest {
        let other = missing_mask(column)?;
        mask = match how {
            DropHow::Any => &mask | &other,
            DropHow::All => &mask & &other,
        };
    }
    Ok(df.filter(&!&mask)?)
}

fn fill_scalar(df: &DataFrame, index_key: Option<&str>, symbol: &str) -> Result<DataFrame> {
    let numeric = symbol.trim().parse::<f64>().ok();
    map_data_columns(df, index_key, |column| {
        if column.null_count() == 0 {
            return Ok(column.clone());
        }
        let series = column.as_materialized_series();
        let dtype = series.dtype().clone();
        let filled = match numeric {
            Some(v) if dtype.is_integer() && v.fract() == 0.0 && float_to_i64(v).is_some() => {
                let fill = float_to_i64(v).unwrap_or_default();
                let ca = series.cast(&DataType::Int64)?;
                let ca = ca.i64()?;
                ca.into_iter()
                    .map(|x| Some(x.unwrap_or(fill)))
                    .collect::<Int64Chunked>()
                    .into_series()
                    .cast(&dtype)?
            }
            Some(v) if dtype.is_numeric() => {
                let ca = series.cast(&DataType::Float64)?;
                let ca = ca.f64()?;
                ca.into_iter()
                    .map(|x| Some(x.unwrap_or(v)))
                    .collect::<Float64Chunked>()
                    .into_series()
            }
            _ => {
                let ca = series.cast(&DataType::String)?;
                let ca = ca.str()?;
                ca.into_iter()
                    .map(|x| Some(x.unwrap_or(symbol)))
                    .collect::<StringChunked>()
                    .into_series()
            }
        };
        Ok(filled.with_name(column.name().clone()).into())
    })
}

fn fill_strategy(
    df: &DataFrame,
    index_key: Option<&str>,
    forward: bool,
    limit: bool,
) -> Result<DataFrame> {
    let gap_limit = if limit { Some(1) } else { None };
    map_data_columns(df, index_key, |column| {
        if column.null_count() == 0 {
            return Ok(column.clone());
        }
        let strategy = if forward {
            FillNullStrategy::Forward(gap_limit)
        } else {
            FillNullStrategy::Backward(gap_limit)
        };
        Ok(column
            .as_materialized_series()
            .fill_null(strategy)?
            .into())
    })
}

fn interpolate(df: &DataFrame, index_key: Option<&str>) -> Result<DataFrame> {
    let names: Vec<String> = data_columns(df, index_key)
        .into_iter()
        .filter(|c| c.dtype().is_numeric() && c.null_count() > 0)
        .map(|c| c.name().to_string())
        .collect();
    if names.is_empty() {
        return Ok(df.clone());
    }
    let exprs: Vec<Expr> = names
        .iter()
        .map(|name| col(name.as_str()).interpolate(InterpolationMethod::Linear))
        .collect();
    let interpolated = df.clone().lazy().with_columns(exprs).collect()?;
    // Trailing gaps take the last valid value; leading gaps stay missing
    map_data_columns(&interpolated, index_key, |column| {
        if !names.iter().any(|n| n == column.name().as_str()) || column.null_count() == 0 {
            return Ok(column.clone());
        }
        Ok(column
            .as_materialized_series()
            .fill_null(FillNullStrategy::Forward(None))?
            .into())
    })
}

fn drop_duplicate_rows(df: &DataFrame, index_key: Option<&str>) -> Result<DataFrame> {
    let subset: Vec<String> = data_columns(df, index_key)
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    if subset.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.unique_stable(Some(subset.as_slice()), UniqueKeepStrategy::First, None)?)
}

/// Drop every data column whose values equal an earlier data column's.
fn drop_duplicate_columns(df: &DataFrame, index_key: Option<&str>) -> Result<DataFrame> {
    let columns = data_columns(df, index_key);
    let mut to_drop = Vec::new();
    for (i, column) in columns.iter().enumerate() {
        let series = column.as_materialized_series();
        let duplicate = columns[..i]
            .iter()
            .filter(|earlier| !to_drop.contains(&earlier.name().to_string()))
            .any(|earlier| {
                earlier.dtype() == column.dtype()
                    && earlier.as_materialized_series().equals_missing(series)
            });
        if duplicate {
            to_drop.push(column.name().to_string());
        }
    }
    Ok(df.drop_many(to_drop))
}

fn round_floats(df: &DataFrame, index_key: Option<&str>, decimals: u32) -> Result<DataFrame> {
    let factor = 10f64.powi(decimals as i32);
    map_data_columns(df, index_key, |column| {
        let dtype = column.dtype().clone();
        if !dtype.is_float() {
            return Ok(column.clone());
        }
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let rounded = series
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| (x * factor).round_ties_even() / factor))
            .collect::<Float64Chunked>()
            .with_name(column.name().clone())
            .into_series()
            .cast(&dtype)?;
        Ok(rounded.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::dialog::OptionValue;

    fn sample() -> DataFrame {
        df!(
            "a" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "b" => [Some("x"), Some("y"), None, Some("w")],
            "c" => [Some(10i64), Some(20), Some(30), Some(40)],
        )
        .unwrap()
    }

    fn opts() -> CleanOptions {
        CleanOptions::default()
    }

    #[test]
    fn test_droprows_any_removes_rows_with_missing() {
        let df = sample();
        let out = clean_data(
            &df,
            None,
            &CleanOptions {
                drop_rows: true,
                ..opts()
            },
        )
        .unwrap();
        assert_eq!(out.height(), 2);
        let c: Vec<Option<i64>> = out.column("c").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(c, vec![Some(10), Some(40)]);
        let b: Vec<Option<&str>> = out.column("b").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(b, vec![Some("x"), Some("w")]);
    }

    #[test]
    fn test_droprows_all_keeps_partial_rows() {
        let df = df!(
            "a" => [Some(1.0), None, None],
            "b" => [Some(2.0), Some(5.0), None],
        )
        .unwrap();
        let out = drop_missing_rows(&df, None, DropHow::All).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let df = df!("a" => [1.0, f64::NAN, 3.0]).unwrap();
        let out = clean_data(
            &df,
            None,
            &CleanOptions {
                drop_rows: true,
                ..opts()
            },
        )
        .unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_index_column_is_ignored() {
        let df = df!(
            "__index__" => [None, Some(1i64), Some(2)],
            "a" => [Some(1.0), Some(2.0), None],
        )
        .unwrap();
        let out = clean_data(
            &df,
            Some("__index__"),
            &CleanOptions {
                drop_rows: true,
                drop_cols: true,
                how: DropHow::All,
                ..opts()
            },
        )
        .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 2);
        assert_eq!(out.column("__index__").unwrap().null_count(), 1);
    }

    #[test]
    fn test_dropcols() {
        let df = df!(
            "full" => [1, 2],
            "partial" => [Some(1), None],
            "empty" => [None::<i32>, None],
        )
        .unwrap();
        let any = drop_missing_columns(&df, None, DropHow::Any).unwrap();
        assert_eq!(any.get_column_names(), &["full"]);
        let all = drop_missing_columns(&df, None, DropHow::All).unwrap();
        assert_eq!(all.get_column_names(), &["full", "partial"]);
    }

    #[test]
    fn test_fill_scalar_numeric_and_text() {
        let df = sample();
        let out = clean_data(
            &df,
            None,
            &CleanOptions {
                method: FillMethod::Scalar,
                symbol: "-".to_string(),
                ..opts()
            },
        )
        .unwrap();
        assert_eq!(out.column("a").unwrap().dtype(), &DataType::String);
        assert_eq!(out.column("a").unwrap().null_count(), 0);
        assert_eq!(out.column("b").unwrap().str().unwrap().get(2), Some("-"));

        let zero = fill_scalar(&sample(), None, "0").unwrap();
        assert_eq!(zero.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(zero.column("a").unwrap().f64().unwrap().get(1), Some(0.0));
    }

    #[test]
    fn test_ffill_with_and_without_limit() {
        let df = df!("a" => [Some(1i64), None, None, Some(4)]).unwrap();
        let limited = fill_strategy(&df, None, true, true).unwrap();
        let vals: Vec<Option<i64>> = limited.column("a").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1), Some(1), None, Some(4)]);

        let unbounded = fill_strategy(&df, None, true, false).unwrap();
        assert_eq!(unbounded.column("a").unwrap().null_count(), 0);

        let back = fill_strategy(&df, None, false, false).unwrap();
        let vals: Vec<Option<i64>> = back.column("a").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1), Some(4), Some(4), Some(4)]);
    }

    #[test]
    fn test_interpolate_linear() {
        let df = df!("a" => [Some(1.0), None, Some(3.0)], "s" => [Some("x"), None, Some("z")]).unwrap();
        let out = interpolate(&df, None).unwrap();
        assert_eq!(out.column("a").unwrap().f64().unwrap().get(1), Some(2.0));
        assert_eq!(out.column("s").unwrap().null_count(), 1);
    }

    #[test]
    fn test_interpolate_carries_last_value_into_trailing_gap() {
        let df = df!("a" => [None, Some(1.0), None, Some(3.0), None, None]).unwrap();
        let out = interpolate(&df, None).unwrap();
        let vals: Vec<Option<f64>> = out.column("a").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![None, Some(1.0), Some(2.0), Some(3.0), Some(3.0), Some(3.0)]);
    }

    #[test]
    fn test_fill_symbol_out_of_int_range_does_not_saturate() {
        let df = df!("n" => [Some(1i64), None]).unwrap();
        let out = fill_scalar(&df, None, "1e30").unwrap();
        let col = out.column("n").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.f64().unwrap().get(1), Some(1e30));

        let out = fill_scalar(&df, None, "-5").unwrap();
        assert_eq!(out.column("n").unwrap().i64().unwrap().get(1), Some(-5));
    }

    #[test]
    fn test_duplicates() {
        let df = df!(
            "a" => [1, 1, 2],
            "b" => [1, 1, 2],
            "c" => ["x", "x", "y"],
        )
        .unwrap();
        let out = clean_data(
            &df,
            None,
            &CleanOptions {
                drop_duplicate_rows: true,
                drop_duplicate_cols: true,
                ..opts()
            },
        )
        .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.get_column_names(), &["a", "c"]);
    }

    #[test]
    fn test_duplicate_rows_ignore_labels() {
        let df = df!("__index__" => [0i64, 1, 2], "a" => [5, 5, 6]).unwrap();
        let out = drop_duplicate_rows(&df, Some("__index__")).unwrap();
        let labels: Vec<Option<i64>> = out.column("__index__").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some(0), Some(2)]);
    }

    #[test]
    fn test_round() {
        let df = df!("a" => [1.234, 2.345], "b" => [1i64, 2]).unwrap();
        let out = round_floats(&df, None, 1).unwrap();
        let vals: Vec<Option<f64>> = out.column("a").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1.2), Some(2.3)]);
        assert_eq!(out.column("b").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_from_values() {
        let values = OptionValues::new()
            .with("method", OptionValue::Text("bfill".into()))
            .with("limit", OptionValue::Flag(false))
            .with("how", OptionValue::Text("all".into()))
            .with("rounddecimals", OptionValue::Number(42));
        let parsed = CleanOptions::from_values(&values).unwrap();
        assert_eq!(parsed.method, FillMethod::Backward);
        assert!(!parsed.limit);
        assert_eq!(parsed.how, DropHow::All);
        assert_eq!(parsed.round_decimals, 10);

        let bad = OptionValues::new().with("method", OptionValue::Text("zigzag".into()));
        assert!(CleanOptions::from_values(&bad).is_err());
    }

    #[test]
    fn test_option_specs_follow_defaults() {
        let specs = opts().option_specs();
        assert_eq!(specs.len(), 9);
        assert_eq!(specs[0].name, "method");
        assert_eq!(specs[8].name, "rounddecimals");
    }
}
