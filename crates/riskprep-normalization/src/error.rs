//! Error types for the normalization pipeline.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Hard failures that abort the pipeline.
///
/// Missing configuration paths are never errors; stages log them and return
/// the table unchanged. Column-level failures during coercion, date parsing
/// and imputation are logged and isolated to the column.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A column the operation requires is not in the table.
    #[error("column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A replacement list that must carry at least one entry is empty.
    #[error("replacement list '{field}' is empty")]
    EmptyReplacementList { field: &'static str },

    /// Underlying table operation failed.
    #[error("table operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Failures while resolving a single date value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The column configuration names no date format.
    #[error("no date format configured")]
    MissingFormat,

    /// The format code is neither a stock pattern nor a custom code.
    #[error("unrecognized date format '{0}'")]
    UnknownFormat(String),

    /// The value does not match the format.
    #[error("value '{value}' does not match date format '{format}'")]
    Unparseable { value: String, format: String },

    /// A custom rule produced fields that are not a calendar date.
    #[error("value '{value}' yields invalid date '{assembled}' under format '{format}'")]
    InvalidDate {
        value: String,
        format: String,
        assembled: String,
    },
}

/// Failures while casting a column to its target type.
#[derive(Debug, Error)]
pub enum CoercionError {
    /// The dtype identifier is not a known target type.
    #[error("unknown dtype identifier '{0}'")]
    UnknownDtype(String),

    /// The column named in `dtype` is not in the table.
    #[error("column '{0}' not found in table")]
    MissingColumn(String),

    /// A non-null value cannot be represented in the target type.
    #[error("cannot cast value '{value}' in column '{column}' to {target}")]
    Unparseable {
        column: String,
        value: String,
        target: String,
    },

    /// Underlying cast failed.
    #[error("cast failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
