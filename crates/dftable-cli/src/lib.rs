//! Shared CLI definitions for dftable.
//!
//! Used by the main application and by the build script (manpage).

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// File format for data files (used to bypass extension-based detection).
/// When `--format` is not specified, format is auto-detected from the file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileFormat {
    /// Parquet columnar format
    Parquet,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// JSON array format
    Json,
    /// JSON Lines / NDJSON (one JSON object per line)
    Jsonl,
    /// Arrow IPC / Feather
    Arrow,
    /// Excel or OpenDocument spreadsheet (.xls, .xlsx, .xlsm, .xlsb, .ods)
    Excel,
}

impl FileFormat {
    /// Detect file format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "parquet", "csv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "parquet" => Some(Self::Parquet),
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            "arrow" | "ipc" | "feather" => Some(Self::Arrow),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Whether tables in this format can be written back by `save`.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Excel)
    }
}

/// Parse a delimiter given as one ASCII character, `\t`/`tab`, or a decimal byte value.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    if matches!(s, "\\t" | "tab") {
        return Ok(b'\t');
    }
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii() && !c.is_ascii_digit() {
            return Ok(c as u8);
        }
    }
    s.parse::<u8>()
        .map_err(|_| format!("invalid delimiter '{}': expected one ASCII character", s))
}

/// Command-line arguments for dftable
#[derive(Clone, Parser, Debug)]
#[command(
    name = "dftable",
    version,
    about = "DataFrame tables in the terminal"
)]
pub struct Args {
    /// Path to the data file to open. Without a path an empty 10x4 table is shown.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Skip this many rows when reading a delimited text file
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,

    /// Specify that the file has no header
    #[arg(long = "no-header")]
    pub no_header: Option<bool>,

    /// Delimiter for delimited text files: a single character (e.g. ';'), "tab", or a byte value
    #[arg(long = "delimiter", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Force file format (parquet, csv, tsv, json, jsonl, arrow, excel).
    /// By default format is auto-detected from the file extension.
    #[arg(long = "format", value_enum)]
    pub format: Option<FileFormat>,

    /// Excel sheet to load: 0-based index (e.g. 0) or sheet name (e.g. "Sales")
    #[arg(long = "sheet", value_name = "SHEET")]
    pub excel_sheet: Option<String>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/dftable/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}
