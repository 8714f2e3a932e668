//! Missing-value helpers shared by the model and the data operations.
//!
//! A value is missing when it is null or a floating-point NaN. Datasets held by
//! [`crate::model::TableModel`] are normalized so NaN is stored as null.

use color_eyre::Result;
use polars::prelude::*;

/// Replace NaN with null in every float column.
pub fn normalize_missing(df: &DataFrame) -> Result<DataFrame> {
    if !df
        .get_columns()
        .iter()
        .any(|c| c.dtype().is_float())
    {
        return Ok(df.clone());
    }
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        columns.push(nan_to_null(column)?);
    }
    Ok(DataFrame::new(columns)?)
}

fn nan_to_null(column: &Column) -> Result<Column> {
    let series = column.as_materialized_series();
    let name = series.name().clone();
    let out: Series = match series.dtype() {
        DataType::Float64 => series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect::<Float64Chunked>()
            .with_name(name)
            .into_series(),
        DataType::Float32 => series
            .f32()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect::<Float32Chunked>()
            .with_name(name)
            .into_series(),
        _ => return Ok(column.clone()),
    };
    Ok(out.into())
}

/// Per-row mask: `true` where the value in `column` is missing.
pub fn missing_mask(column: &Column) -> Result<BooleanChunked> {
    let series = column.as_materialized_series();
    let mask: BooleanChunked = match series.dtype() {
        DataType::Float64 => series
            .f64()?
            .into_iter()
            .map(|v| Some(v.is_none_or(|x| x.is_nan())))
            .collect(),
        DataType::Float32 => series
            .f32()?
            .into_iter()
            .map(|v| Some(v.is_none_or(|x| x.is_nan())))
            .collect(),
        _ => series.is_null(),
    };
    Ok(mask)
}

/// Number of missing values in `column`.
pub fn missing_count(column: &Column) -> Result<usize> {
    Ok(missing_mask(column)?
        .into_iter()
        .filter(|v| *v == Some(true))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_turns_nan_into_null() {
        let df = df!(
            "x" => [Some(1.0), Some(f64::NAN), None],
            "s" => ["a", "b", "c"],
        )
        .unwrap();
        let out = normalize_missing(&df).unwrap();
        assert_eq!(out.column("x").unwrap().null_count(), 2);
        assert_eq!(out.column("s").unwrap().null_count(), 0);
    }

    #[test]
    fn test_missing_mask_counts_nan_and_null() {
        let df = df!("x" => [Some(1.0), Some(f64::NAN), None]).unwrap();
        let col = df.column("x").unwrap();
        assert_eq!(missing_count(col).unwrap(), 2);
        let mask = missing_mask(col).unwrap();
        assert_eq!(mask.get(0), Some(false));
        assert_eq!(mask.get(1), Some(true));
    }
}
