//! Date normalization.
//!
//! Each configured date column is parsed with its registered format and
//! rewritten as canonical `YYYY-MM-DD` text. A column either converts as a
//! whole or is left untouched; one bad value never half-converts a column.

mod custom;
mod registry;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use polars::prelude::*;
use riskprep_common::{any_to_string, any_to_string_non_empty};
use riskprep_model::{DateColumnConfig, PipelineConfig, Separators};

use crate::error::{DateError, Result};

pub use registry::{
    CustomFormat, CustomRule, DateFormat, FormatRegistry, ISO8601, StockFormat, StockPattern,
    is_known_date_format,
};

/// Canonical rendering of every normalized date.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Rewrites every configured date column as canonical `YYYY-MM-DD` text.
///
/// Unrecognized formats, absent columns and unparseable values are logged and
/// leave that column as it was; the remaining columns still convert.
pub fn normalize_dates(mut df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let Some(date_columns) = config.date_columns() else {
        tracing::warn!("missing configuration key for date conversion: date_columns");
        return Ok(df);
    };

    let registry = FormatRegistry::global();
    for (column, entry) in date_columns.iter() {
        tracing::info!(column, "processing date column");

        let code = entry.date_format.as_deref().unwrap_or_default();
        let Some(format) = registry.resolve(code) else {
            tracing::warn!(column, format = code, "unrecognized date format");
            continue;
        };
        tracing::info!(column, format = code, kind = format.kind(), "using date format");

        let series = match df.column(column) {
            Ok(col) => col.as_materialized_series().clone(),
            Err(_) => {
                tracing::error!(column, "date column not found in table");
                continue;
            }
        };

        match normalize_series(&series, format, entry.separator.as_ref()) {
            Ok(normalized) => {
                log_unique_values(column, &normalized);
                df.with_column(normalized)?;
            }
            Err(err) => {
                tracing::error!(column, error = %err, "failed to convert date column");
            }
        }
    }

    Ok(df)
}

/// Parses a single raw value according to a date column configuration.
pub fn normalize_date_value(
    raw: &str,
    config: &DateColumnConfig,
) -> std::result::Result<NaiveDate, DateError> {
    let code = config
        .date_format
        .as_deref()
        .ok_or(DateError::MissingFormat)?;
    let format = FormatRegistry::global()
        .resolve(code)
        .ok_or_else(|| DateError::UnknownFormat(code.to_string()))?;
    parse_value(format, raw, config.separator.as_ref())
}

fn parse_value(
    format: DateFormat,
    raw: &str,
    separators: Option<&Separators>,
) -> std::result::Result<NaiveDate, DateError> {
    match format {
        DateFormat::Stock(stock) => stock.parse(raw.trim()),
        DateFormat::Custom(custom) => {
            let stripped = match separators {
                Some(separators) => separators.strip(raw),
                None => raw.to_string(),
            };
            custom.parse(stripped.trim())
        }
    }
}

/// Nulls and blank values stay null; any other unparseable value fails the column.
fn normalize_series(
    series: &Series,
    format: DateFormat,
    separators: Option<&Separators>,
) -> std::result::Result<Series, DateError> {
    let mut values: Vec<Option<String>> = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        let Some(raw) = any_to_string_non_empty(series.get(idx).unwrap_or(AnyValue::Null)) else {
            values.push(None);
            continue;
        };
        let date = parse_value(format, &raw, separators)?;
        values.push(Some(date.format(CANONICAL_DATE_FORMAT).to_string()));
    }
    Ok(Series::new(series.name().clone(), values))
}

fn log_unique_values(column: &str, series: &Series) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let unique: BTreeSet<String> = (0..series.len())
        .filter_map(|idx| series.get(idx).ok())
        .filter(|value| !value.is_null())
        .map(any_to_string)
        .collect();
    let sample: Vec<&String> = unique.iter().take(10).collect();
    tracing::debug!(column, distinct = unique.len(), ?sample, "normalized date values");
}
