use dftable::clean::{clean_data, CleanOptions, DropHow, FillMethod};
use dftable::convert::{convert_numeric, ConvertOptions};
use dftable::model::{HeaderAxis, TableModel};
use polars::prelude::*;

mod common;
use common::prices;

fn datasets() -> Vec<DataFrame> {
    vec![
        prices(),
        df!("x" => [1i64]).unwrap(),
        df!(
            "a" => [Some("u"), None, Some("w"), Some("u")],
            "b" => [Some(1.5), Some(f64::NAN), None, Some(-2.0)],
        )
        .unwrap(),
        DataFrame::new(vec![Column::full_null("empty".into(), 3, &DataType::String)]).unwrap(),
    ]
}

fn snapshot(model: &TableModel) -> Vec<Vec<String>> {
    (0..model.row_count())
        .map(|r| {
            (0..model.column_count())
                .map(|c| model.value_at(r, c))
                .collect()
        })
        .collect()
}

fn label(model: &TableModel, row: usize) -> usize {
    model
        .header_label(HeaderAxis::Vertical, row)
        .parse()
        .unwrap()
}

#[test]
fn test_shape_matches_dataset() {
    for df in datasets() {
        let model = TableModel::new(df.clone()).unwrap();
        assert_eq!(model.row_count(), df.height());
        assert_eq!(model.column_count(), df.width());
        for c in 0..model.column_count() {
            assert_eq!(
                model.header_label(HeaderAxis::Horizontal, c),
                df.get_column_names()[c].as_str()
            );
        }
        for r in 0..model.row_count() {
            assert_eq!(label(&model, r), r);
        }
        // out of range reads are empty rather than errors
        assert_eq!(model.value_at(model.row_count(), 0), "");
        assert_eq!(model.header_label(HeaderAxis::Horizontal, 99), "");
    }
}

#[test]
fn test_sort_is_monotonic_and_keeps_rows_together() {
    for df in datasets() {
        for col in 0..df.width() {
            for ascending in [true, false] {
                let original = TableModel::new(df.clone()).unwrap();
                let before = snapshot(&original);
                let mut model = TableModel::new(df.clone()).unwrap();
                model.sort_by_column(col, ascending).unwrap();

                assert_eq!(model.row_count(), original.row_count());
                assert!(model.generation() > original.generation());

                let after = snapshot(&model);
                for (r, row) in after.iter().enumerate() {
                    assert_eq!(row, &before[label(&model, r)]);
                }

                // missing values sort to the end
                let first_missing = after.iter().position(|row| row[col].is_empty());
                if let Some(first) = first_missing {
                    assert!(after[first..].iter().all(|row| row[col].is_empty()));
                }

                let column = model.data_frame().get_columns()[col].clone();
                if column.dtype().is_primitive_numeric() {
                    let values: Vec<f64> = column
                        .cast(&DataType::Float64)
                        .unwrap()
                        .f64()
                        .unwrap()
                        .into_iter()
                        .flatten()
                        .collect();
                    let ordered = values.windows(2).all(|w| {
                        if ascending {
                            w[0] <= w[1]
                        } else {
                            w[0] >= w[1]
                        }
                    });
                    assert!(ordered, "column {} not sorted: {:?}", col, values);
                }
            }
        }
    }
}

#[test]
fn test_missing_values_render_empty() {
    let df = df!(
        "f" => [Some(f64::NAN), None, Some(0.5)],
        "s" => [None, Some("x"), Some("")],
    )
    .unwrap();
    let model = TableModel::new(df).unwrap();
    assert_eq!(model.value_at(0, 0), "");
    assert_eq!(model.value_at(1, 0), "");
    assert_eq!(model.value_at(2, 0), "0.5");
    assert_eq!(model.value_at(0, 1), "");
    assert_eq!(model.value_at(1, 1), "x");
    let summary = model.summary().unwrap();
    assert_eq!(summary.columns[0].missing, 2);
}

#[test]
fn test_drop_rows_keeps_labels_of_survivors() {
    let mut model = TableModel::new(prices()).unwrap();
    let opts = CleanOptions {
        drop_rows: true,
        how: DropHow::Any,
        ..CleanOptions::default()
    };
    model
        .transform(|df, key| clean_data(df, Some(key), &opts))
        .unwrap();
    assert_eq!(model.row_count(), 2);
    assert_eq!(label(&model, 0), 0);
    assert_eq!(label(&model, 1), 3);
    assert_eq!(model.column_count(), 3);
}

#[test]
fn test_forward_fill_never_adds_rows() {
    for df in datasets() {
        let mut model = TableModel::new(df.clone()).unwrap();
        let opts = CleanOptions {
            method: FillMethod::Forward,
            ..CleanOptions::default()
        };
        model
            .transform(|df, key| clean_data(df, Some(key), &opts))
            .unwrap();
        assert_eq!(model.row_count(), df.height());
        assert_eq!(model.column_count(), df.width());
    }
}

#[test]
fn test_convert_currency_text() {
    let df = df!("amount" => ["$1,200", "£3.50", "(7)", "n/a"]).unwrap();
    let opts = ConvertOptions {
        currency: true,
        ..ConvertOptions::default()
    };
    let out = convert_numeric(&df, &["amount".to_string()], &opts).unwrap();
    let values: Vec<Option<i64>> = out
        .column("amount")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(values, vec![Some(1200), Some(3), Some(-7), None]);
}
