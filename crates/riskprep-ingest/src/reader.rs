//! Reading tables from delimited text and JSON record files.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Rows scanned when inferring column types of delimited files.
pub const INFER_SCHEMA_ROWS: usize = 10_000;

/// On-disk layout of an input table, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// `.csv` and `.txt`, comma separated with a header row.
    Csv,
    /// `.tsv`, tab separated with a header row.
    Tsv,
    /// `.json`, an array of records.
    Json,
    /// `.ndjson` and `.jsonl`, one record per line.
    JsonLines,
}

impl TableFormat {
    /// Resolves the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::JsonLines),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Reads a table file into a DataFrame.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let format = TableFormat::from_path(path)?;
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let parse_error = |e: PolarsError| IngestError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = match format {
        TableFormat::Csv => read_delimited(path, b',').map_err(parse_error)?,
        TableFormat::Tsv => read_delimited(path, b'\t').map_err(parse_error)?,
        TableFormat::Json => {
            let file = File::open(path).map_err(|e| IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            JsonReader::new(file).finish().map_err(parse_error)?
        }
        TableFormat::JsonLines => JsonLineReader::from_path(path)
            .and_then(SerReader::finish)
            .map_err(parse_error)?,
    };

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

fn read_delimited(path: &Path, separator: u8) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("a.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("a.txt")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("a.tsv")).unwrap(),
            TableFormat::Tsv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("a.jsonl")).unwrap(),
            TableFormat::JsonLines
        );
    }

    #[test]
    fn test_spreadsheets_are_unsupported() {
        let err = TableFormat::from_path(Path::new("loans.xlsx")).unwrap_err();
        match err {
            IngestError::UnsupportedFormat { path, extension } => {
                assert_eq!(path, PathBuf::from("loans.xlsx"));
                assert_eq!(extension, "xlsx");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/nonexistent/loans.csv")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }
}
