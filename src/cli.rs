//! Command-line arguments live in the `dftable-cli` crate so `build.rs` can
//! generate the man page from the same definitions.

pub use dftable_cli::{parse_delimiter, Args, FileFormat};
