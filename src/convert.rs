//! Convert-numeric operation.
//!
//! Each target column is optionally filled, stripped of currency symbols and
//! stray text, then parsed as a number. Values that fail to parse become
//! missing rather than raising an error.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use regex::Regex;

use crate::widgets::dialog::{OptionSpec, OptionValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericType {
    Float,
    #[default]
    Int,
}

impl NumericType {
    pub const LABELS: [&'static str; 2] = ["float", "int"];

    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "float" => Ok(NumericType::Float),
            "int" | "" => Ok(NumericType::Int),
            other => Err(eyre!("Unknown numeric type: '{}'", other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericType::Float => "float",
            NumericType::Int => "int",
        }
    }

    pub fn dtype(self) -> DataType {
        match self {
            NumericType::Float => DataType::Float64,
            NumericType::Int => DataType::Int64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    pub target: NumericType,
    pub remove_text: bool,
    pub currency: bool,
    pub selected_only: bool,
    pub fill_empty: bool,
}

impl ConvertOptions {
    pub fn option_specs(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::combo(
                "convert to",
                "Convert To",
                &NumericType::LABELS,
                self.target.label(),
            ),
            OptionSpec::check("removetext", "try to remove text", self.remove_text)
                .with_tooltip("drop every character that is not a digit or '.'"),
            OptionSpec::check("convert currency", "convert currency", self.currency)
                .with_tooltip("strip $ £ € , and turn (x) into -x"),
            OptionSpec::check(
                "selected columns only",
                "selected columns only",
                self.selected_only,
            ),
            OptionSpec::check("fill empty", "Fill Empty", self.fill_empty)
                .with_tooltip("fill missing values with 0 first"),
        ]
    }

    pub fn from_values(values: &OptionValues) -> Result<Self> {
        Ok(Self {
            target: NumericType::from_label(values.text("convert to"))?,
            remove_text: values.flag("removetext"),
            currency: values.flag("convert currency"),
            selected_only: values.flag("selected columns only"),
            fill_empty: values.flag("fill empty"),
        })
    }
}

/// Compiled patterns for currency and text stripping.
struct TextCleaner {
    currency_symbols: Regex,
    open_paren: Regex,
    non_numeric: Regex,
}

impl TextCleaner {
    fn new() -> Result<Self> {
        Ok(Self {
            currency_symbols: Regex::new(r"[$£€,)]")?,
            open_paren: Regex::new(r"[(]")?,
            non_numeric: Regex::new(r"[^\d.]+")?,
        })
    }

    fn clean(&self, value: &str, opts: &ConvertOptions) -> String {
        let mut text = value.to_string();
        if opts.currency {
            text = self.currency_symbols.replace_all(&text, "").into_owned();
            text = self.open_paren.replace_all(&text, "-").into_owned();
        }
        if opts.remove_text {
            text = self.non_numeric.replace_all(&text, "").into_owned();
        }
        text
    }
}

/// Convert the named columns of `df` to the target numeric type.
pub fn convert_numeric(df: &DataFrame, columns: &[String], opts: &ConvertOptions) -> Result<DataFrame> {
    let cleaner = TextCleaner::new()?;
    let mut out = df.clone();
    for name in columns {
        let column = df.column(name)?;
        let converted = convert_column(column.as_materialized_series(), opts, &cleaner)?;
        out.with_column(converted)?;
    }
    Ok(out)
}

fn convert_column(series: &Series, opts: &ConvertOptions, cleaner: &TextCleaner) -> Result<Series> {
    let name = series.name().clone();
    let floats: Float64Chunked = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| {
                let text = match v {
                    Some(s) => cleaner.clean(s, opts),
                    None if opts.fill_empty => "0".to_string(),
                    None => return None,
                };
                parse_number(&text)
            })
            .collect(),
        _ => {
            // Coerce anything that has no float representation to missing
            let cast = series
                .cast(&DataType::Float64)
                .unwrap_or_else(|_| Series::full_null(name.clone(), series.len(), &DataType::Float64));
            cast.f64()?
                .into_iter()
                .map(|v| match v {
                    None if opts.fill_empty => Some(0.0),
                    other => other.filter(|x| !x.is_nan()),
                })
                .collect()
        }
    };

    let out = match opts.target {
        NumericType::Float => floats.with_name(name).into_series(),
        NumericType::Int => floats
            .into_iter()
            .map(|v| v.and_then(float_to_i64))
            .collect::<Int64Chunked>()
            .with_name(name)
            .into_series(),
    };
    Ok(out)
}

/// Truncate toward zero; `None` when the value is not finite or does not fit in an `i64`.
pub(crate) fn float_to_i64(x: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX as f64 rounds up to it
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let t = x.trunc();
    (t.is_finite() && (-LIMIT..LIMIT).contains(&t)).then_some(t as i64)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|x| !x.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::dialog::OptionValue;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_out_of_range_int_becomes_missing() {
        let df = df!("x" => ["1e30", "-1e30", "12.9", "inf"]).unwrap();
        let out = convert_numeric(&df, &names(&df), &ConvertOptions::default()).unwrap();
        let vals: Vec<Option<i64>> = out.column("x").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![None, None, Some(12), None]);
        assert_eq!(float_to_i64(-9_223_372_036_854_775_808.0), Some(i64::MIN));
    }

    #[test]
    fn test_currency_to_int() {
        let df = df!("price" => ["$1,200", "(€35)", "£7"]).unwrap();
        let opts = ConvertOptions {
            currency: true,
            ..Default::default()
        };
        let out = convert_numeric(&df, &names(&df), &opts).unwrap();
        let col = out.column("price").unwrap();
        assert_eq!(col.dtype(), &DataType::Int64);
        let vals: Vec<Option<i64>> = col.i64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1200), Some(-35), Some(7)]);
    }

    #[test]
    fn test_failures_become_missing() {
        let df = df!("x" => [Some("1.5"), Some("abc"), None, Some("")]).unwrap();
        let opts = ConvertOptions {
            target: NumericType::Float,
            ..Default::default()
        };
        let out = convert_numeric(&df, &names(&df), &opts).unwrap();
        let vals: Vec<Option<f64>> = out.column("x").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1.5), None, None, None]);
    }

    #[test]
    fn test_remove_text_and_fill_empty() {
        let df = df!("x" => [Some("12 kg"), None, Some("approx 3.5")]).unwrap();
        let opts = ConvertOptions {
            target: NumericType::Float,
            remove_text: true,
            fill_empty: true,
            ..Default::default()
        };
        let out = convert_numeric(&df, &names(&df), &opts).unwrap();
        let vals: Vec<Option<f64>> = out.column("x").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(12.0), Some(0.0), Some(3.5)]);
    }

    #[test]
    fn test_numeric_columns_and_subset() {
        let df = df!(
            "f" => [Some(1.9), None],
            "s" => ["1", "2"],
        )
        .unwrap();
        let out = convert_numeric(&df, &["f".to_string()], &ConvertOptions::default()).unwrap();
        let vals: Vec<Option<i64>> = out.column("f").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1), None]);
        // untouched column keeps its type
        assert_eq!(out.column("s").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_unknown_column_errors() {
        let df = df!("a" => [1]).unwrap();
        assert!(convert_numeric(&df, &["zz".to_string()], &ConvertOptions::default()).is_err());
    }

    #[test]
    fn test_from_values() {
        let values = OptionValues::new()
            .with("convert to", OptionValue::Text("float".into()))
            .with("convert currency", OptionValue::Flag(true))
            .with("selected columns only", OptionValue::Flag(true));
        let opts = ConvertOptions::from_values(&values).unwrap();
        assert_eq!(opts.target, NumericType::Float);
        assert!(opts.currency);
        assert!(opts.selected_only);
        assert!(!opts.remove_text);
        assert_eq!(ConvertOptions::default().option_specs().len(), 5);
    }
}
