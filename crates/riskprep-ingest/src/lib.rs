//! Table ingestion for the riskprep pipeline.
//!
//! Loads uploaded data files into Polars DataFrames and writes the
//! canonical table back out.
//!
//! # Supported formats
//!
//! - **Delimited text**: `.csv`, `.txt` (comma) and `.tsv` (tab), header row required
//! - **JSON records**: `.json` (array of objects), `.ndjson` / `.jsonl` (one object per line)
//!
//! Spreadsheet files are rejected with [`IngestError::UnsupportedFormat`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use riskprep_ingest::{read_table, write_csv};
//!
//! let mut df = read_table(Path::new("uploads/loans.csv"))?;
//! write_csv(&mut df, Path::new("output/loans.csv"))?;
//! ```

mod error;
mod reader;
mod writer;

// === Error Types ===
pub use error::{IngestError, Result};

// === Reading ===
pub use reader::{INFER_SCHEMA_ROWS, TableFormat, read_table};

// === Writing ===
pub use writer::write_csv;
