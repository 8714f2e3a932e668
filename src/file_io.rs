//! Reading and writing datasets by file format.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook_auto, Data, Reader};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dftable_cli::FileFormat;
use polars::prelude::*;

use crate::widgets::dialog::{OptionSpec, OptionValues};

/// Options for reading delimited text and spreadsheets.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub skip_rows: usize,
    /// 0-based index or sheet name; first sheet when `None`
    pub excel_sheet: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            skip_rows: 0,
            excel_sheet: None,
        }
    }
}

pub const MAX_SKIP_ROWS: i64 = 1000;

impl ImportOptions {
    pub fn option_specs(&self, path: &str) -> Vec<OptionSpec> {
        let delimiter = match self.delimiter {
            b'\t' => "tab".to_string(),
            d => (d as char).to_string(),
        };
        vec![
            OptionSpec::entry("path", "File", path),
            OptionSpec::combo("delimiter", "Delimiter", &[",", ";", "tab", "|", " "], &delimiter)
                .with_tooltip("column separator"),
            OptionSpec::check("header", "Header row", self.has_header),
            OptionSpec::spin("skip rows", "Skip rows", 0, MAX_SKIP_ROWS, self.skip_rows as i64),
        ]
    }

    pub fn from_values(values: &OptionValues) -> Result<Self> {
        let delimiter = match values.text("delimiter") {
            "tab" => b'\t',
            d if d.len() == 1 => d.as_bytes()[0],
            other => return Err(eyre!("Invalid delimiter: '{}'", other)),
        };
        Ok(Self {
            delimiter,
            has_header: values.flag("header"),
            skip_rows: values.number("skip rows").max(0) as usize,
            excel_sheet: None,
        })
    }
}

/// Read `path` eagerly. The format comes from `format` or the file extension.
pub fn load(path: &Path, format: Option<FileFormat>, opts: &ImportOptions) -> Result<DataFrame> {
    let format = format
        .or_else(|| FileFormat::from_path(path))
        .ok_or_else(|| eyre!("Unknown file type: {}", path.display()))?;
    let pl_path = PlPath::Local(Arc::from(path));
    let df = match format {
        FileFormat::Csv => import_delimited(path, opts)?,
        FileFormat::Tsv => import_delimited(
            path,
            &ImportOptions {
                delimiter: b'\t',
                ..opts.clone()
            },
        )?,
        FileFormat::Parquet => LazyFrame::scan_parquet(pl_path, Default::default())?.collect()?,
        FileFormat::Arrow => {
            LazyFrame::scan_ipc(pl_path, Default::default(), Default::default())?.collect()?
        }
        FileFormat::Json => {
            let file = File::open(path)?;
            JsonReader::new(file)
                .with_json_format(JsonFormat::Json)
                .finish()?
        }
        FileFormat::Jsonl => LazyJsonLineReader::new(pl_path).finish()?.collect()?,
        FileFormat::Excel => load_excel(path, opts.excel_sheet.as_deref())?,
    };
    Ok(df)
}

/// Read a delimited text file with explicit delimiter, header and skip options.
pub fn import_delimited(path: &Path, opts: &ImportOptions) -> Result<DataFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    Ok(LazyCsvReader::new(pl_path)
        .with_separator(opts.delimiter)
        .with_has_header(opts.has_header)
        .with_skip_rows(opts.skip_rows)
        .finish()?
        .collect()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExcelColType {
    Int64,
    Float64,
    Boolean,
    Datetime,
    Utf8,
}

/// Read one sheet of a spreadsheet; the first row holds the column names.
pub fn load_excel(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| eyre!("Excel: {}", e))?;
    if workbook.sheet_names().is_empty() {
        return Err(eyre!("Excel file has no worksheets"));
    }
    let range = match sheet {
        Some(sel) => match sel.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| eyre!("Excel: no sheet at index {}", idx))?
                .map_err(|e| eyre!("Excel: {}", e))?,
            Err(_) => workbook
                .worksheet_range(sel)
                .map_err(|e| eyre!("Excel: {}", e))?,
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| eyre!("Excel: no first sheet"))?
            .map_err(|e| eyre!("Excel: {}", e))?,
    };
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    let Some((header, body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };

    let mut columns = Vec::with_capacity(header.len());
    for (col_idx, cell) in header.iter().enumerate() {
        let name = match calamine::DataType::as_string(cell) {
            Some(s) if !s.is_empty() => s,
            _ => format!("column_{}", col_idx + 1),
        };
        let cells: Vec<Option<&Data>> = body
            .iter()
            .map(|row| row.get(col_idx).filter(|c| !matches!(c, Data::Empty)))
            .collect();
        let series = excel_column_to_series(&name, &cells, excel_infer_column_type(&cells))?;
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

fn excel_infer_column_type(cells: &[Option<&Data>]) -> ExcelColType {
    use calamine::DataType as CalamineTrait;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if CalamineTrait::is_string(*cell) {
            return ExcelColType::Utf8;
        }
        if CalamineTrait::is_datetime(*cell) || CalamineTrait::is_datetime_iso(*cell) {
            has_datetime = true;
        } else if CalamineTrait::is_float(*cell) {
            has_float = true;
        } else if CalamineTrait::is_int(*cell) {
            has_int = true;
        } else if CalamineTrait::is_bool(*cell) {
            has_bool = true;
        }
    }
    if has_datetime {
        ExcelColType::Datetime
    } else if has_float {
        // Spreadsheets store every number as a float; keep whole numbers as integers
        let all_whole = cells.iter().flatten().all(|cell| {
            cell.as_f64()
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole {
            ExcelColType::Int64
        } else {
            ExcelColType::Float64
        }
    } else if has_int {
        ExcelColType::Int64
    } else if has_bool {
        ExcelColType::Boolean
    } else {
        ExcelColType::Utf8
    }
}

fn excel_column_to_series(
    name: &str,
    cells: &[Option<&Data>],
    col_type: ExcelColType,
) -> Result<Series> {
    use calamine::DataType as CalamineTrait;
    use polars::datatypes::TimeUnit;
    let series = match col_type {
        ExcelColType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.as_i64()))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.as_f64()))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|cell| CalamineTrait::as_datetime(cell))
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
        ExcelColType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.as_string()))
                .collect();
            Series::new(name.into(), v)
        }
    };
    Ok(series)
}

/// Write `df` to `path` in the format named by its extension.
pub fn save(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)
        .ok_or_else(|| eyre!("Unknown file type: {}", path.display()))?;
    match format {
        FileFormat::Csv | FileFormat::Tsv => {
            let separator = if format == FileFormat::Tsv { b'\t' } else { b',' };
            let file = File::create(path)?;
            CsvWriter::new(file)
                .with_separator(separator)
                .include_header(true)
                .finish(df)?;
        }
        FileFormat::Parquet => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            ParquetWriter::new(&mut writer).finish(df)?;
        }
        FileFormat::Arrow => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            IpcWriter::new(&mut writer).finish(df)?;
        }
        FileFormat::Json | FileFormat::Jsonl => {
            let json_format = if format == FileFormat::Jsonl {
                JsonFormat::JsonLines
            } else {
                JsonFormat::Json
            };
            let file = File::create(path)?;
            JsonWriter::new(file)
                .with_json_format(json_format)
                .finish(df)?;
        }
        FileFormat::Excel => {
            return Err(eyre!("Saving to {:?} files is not supported", format));
        }
    }
    Ok(())
}
