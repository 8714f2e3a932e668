//! Pivot operation: spread the distinct values of one column into new columns.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;

use crate::widgets::dialog::{OptionSpec, OptionValue, OptionValues};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PivotAggregation {
    #[default]
    First,
    Last,
    Min,
    Max,
    Mean,
    Median,
    Sum,
    Count,
}

impl PivotAggregation {
    pub const ALL: [Self; 8] = [
        Self::First,
        Self::Last,
        Self::Min,
        Self::Max,
        Self::Mean,
        Self::Median,
        Self::Sum,
        Self::Count,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Sum => "sum",
            Self::Count => "count",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == label)
            .ok_or_else(|| eyre!("Unknown aggregation: '{}'", label))
    }

    fn expr(self) -> Expr {
        let e = col(PlSmallStr::from_static(""));
        match self {
            Self::First => e.first(),
            Self::Last => e.last(),
            Self::Min => e.min(),
            Self::Max => e.max(),
            Self::Mean => e.mean(),
            Self::Median => e.median(),
            Self::Sum => e.sum(),
            Self::Count => e.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotSpec {
    /// Column whose values become the row keys
    pub index: String,
    /// Column whose distinct values become the new columns
    pub columns: String,
    /// Column aggregated into the cells
    pub values: String,
    pub aggregation: PivotAggregation,
}

impl PivotSpec {
    pub fn option_specs(column_names: &[String]) -> Vec<OptionSpec> {
        let aggregations: Vec<&str> = PivotAggregation::ALL.iter().map(|a| a.as_str()).collect();
        let mut specs = vec![
            OptionSpec::combo_owned("index", "Index", column_names.to_vec()),
            OptionSpec::combo_owned("columns", "Columns", column_names.to_vec()),
            OptionSpec::combo_owned("values", "Values", column_names.to_vec()),
            OptionSpec::combo("aggregation", "Aggregation", &aggregations, "first"),
        ];
        // Start with three different columns when the dataset has them
        for (i, spec) in specs.iter_mut().take(3).enumerate() {
            if let Some(name) = column_names.get(i) {
                spec.default = OptionValue::Text(name.clone());
            }
        }
        specs
    }

    pub fn from_values(values: &OptionValues) -> Result<Self> {
        Ok(Self {
            index: values.text("index").to_string(),
            columns: values.text("columns").to_string(),
            values: values.text("values").to_string(),
            aggregation: PivotAggregation::from_label(values.text("aggregation"))?,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.index.is_empty() || self.columns.is_empty() || self.values.is_empty() {
            return Err(eyre!("Pivot needs an index, a columns and a values column"));
        }
        if self.index == self.columns || self.index == self.values || self.columns == self.values
        {
            return Err(eyre!(
                "Pivot index, columns and values must be three different columns"
            ));
        }
        Ok(())
    }
}

/// Pivot `df`. The index column comes first in the result, followed by one
/// column per distinct value of `spec.columns` in order of appearance.
pub fn pivot(df: &DataFrame, spec: &PivotSpec) -> Result<DataFrame> {
    spec.validate()?;
    Ok(pivot_stable(
        df,
        [spec.columns.as_str()],
        Some([spec.index.as_str()]),
        Some([spec.values.as_str()]),
        false,
        Some(spec.aggregation.expr()),
        None,
    )?)
}
