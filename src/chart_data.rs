//! Prepare plot data: numeric columns as (row position, value) series.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

const CHART_ROW_LIMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Numeric columns among `columns`, or every numeric column when `columns` is empty.
pub fn plot_columns(df: &DataFrame, columns: &[String]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(|c| c.name().to_string())
        .filter(|name| columns.is_empty() || columns.contains(name))
        .collect()
}

/// One series per column with x = row position. Missing values leave gaps
/// and at most `CHART_ROW_LIMIT` rows are used.
pub fn prepare_plot_data(df: &DataFrame, columns: &[String]) -> Result<Vec<PlotSeries>> {
    let names = plot_columns(df, columns);
    if names.is_empty() {
        return Err(eyre!("No numeric columns to plot"));
    }

    let df = df.slice(0, CHART_ROW_LIMIT);
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let values = df.column(&name)?.cast(&DataType::Float64)?;
        let points = values
            .f64()?
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|y| y.is_finite()).map(|y| (i as f64, y)))
            .collect();
        out.push(PlotSeries { name, points });
    }
    Ok(out)
}
