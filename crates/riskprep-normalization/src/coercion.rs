//! Column type coercion.
//!
//! Date columns are normalized first so that a `date`/`datetime` target sees
//! canonical text. The cast is then attempted for every column in `dtype` at
//! once; if any column fails, each column is applied independently and the
//! failing ones keep their original type.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use riskprep_common::{any_to_f64, any_to_i64, any_to_string};
use riskprep_model::{PipelineConfig, TargetType};

use crate::dates::normalize_dates;
use crate::error::{CoercionError, Result};

/// Normalizes date columns, then casts each column named in `dtype`.
pub fn coerce_types(df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    tracing::info!("converting date columns");
    let mut df = normalize_dates(df, config)?;

    let Some(dtype) = config.dtype() else {
        tracing::warn!("missing configuration key for data type conversion: dtype");
        return Ok(df);
    };

    let attempts: Vec<(&str, &str, std::result::Result<Series, CoercionError>)> = dtype
        .iter()
        .map(|(column, identifier)| {
            let result = cast_named(&df, column, identifier);
            (column, identifier.as_str(), result)
        })
        .collect();

    if let Some((column, _, Err(err))) = attempts.iter().find(|(_, _, result)| result.is_err()) {
        tracing::warn!(
            column,
            error = %err,
            "bulk conversion failed; attempting column-by-column conversion"
        );
    }
    let all_ok = attempts.iter().all(|(_, _, result)| result.is_ok());

    for (column, identifier, result) in attempts {
        match result {
            Ok(series) => {
                df.with_column(series)?;
                if !all_ok {
                    tracing::info!(column, dtype = identifier, "column converted");
                }
            }
            Err(err) => {
                tracing::error!(column, dtype = identifier, error = %err, "failed to convert column");
            }
        }
    }
    if all_ok {
        tracing::info!(columns = dtype.len(), "all columns converted successfully");
    }

    Ok(df)
}

fn cast_named(
    df: &DataFrame,
    column: &str,
    identifier: &str,
) -> std::result::Result<Series, CoercionError> {
    let target: TargetType = identifier
        .parse()
        .map_err(|_| CoercionError::UnknownDtype(identifier.to_string()))?;
    let series = df
        .column(column)
        .map_err(|_| CoercionError::MissingColumn(column.to_string()))?
        .as_materialized_series();
    cast_column(series, target)
}

/// Strictly casts a column to `target`.
///
/// Nulls stay null. Any other value that has no exact representation in the
/// target type fails the whole column; integers never truncate fractions.
pub fn cast_column(
    series: &Series,
    target: TargetType,
) -> std::result::Result<Series, CoercionError> {
    let name = series.name().clone();
    let failure = |value: AnyValue<'_>| CoercionError::Unparseable {
        column: name.to_string(),
        value: any_to_string(value),
        target: target.to_string(),
    };

    let cast = match target {
        TargetType::Int64 => {
            let values = convert(series, |value| int_value(value.clone()), failure)?;
            Series::new(name.clone(), values)
        }
        TargetType::Int32 => {
            let values = convert(
                series,
                |value| int_value(value.clone()).and_then(|v| i32::try_from(v).ok()),
                failure,
            )?;
            Series::new(name.clone(), values)
        }
        TargetType::Float64 => {
            let values = convert(series, |value| float_value(value.clone()), failure)?;
            Series::new(name.clone(), values)
        }
        TargetType::Float32 => {
            let values = convert(
                series,
                |value| float_value(value.clone()).map(|v| v as f32),
                failure,
            )?;
            Series::new(name.clone(), values)
        }
        TargetType::String => {
            let values = convert(series, |value| Some(any_to_string(value.clone())), failure)?;
            Series::new(name.clone(), values)
        }
        TargetType::Boolean => {
            let values = convert(series, |value| bool_value(value.clone()), failure)?;
            Series::new(name.clone(), values)
        }
        TargetType::Date => {
            let values = convert(
                series,
                |value| date_value(value).map(days_since_epoch),
                failure,
            )?;
            Series::new(name.clone(), values).cast(&DataType::Date)?
        }
        TargetType::Datetime => {
            let values = convert(
                series,
                |value| datetime_value(value).map(|dt| dt.and_utc().timestamp_millis()),
                failure,
            )?;
            Series::new(name.clone(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
    };
    Ok(cast)
}

/// Applies `parse` to every non-null value, failing on the first miss.
fn convert<T, P, F>(
    series: &Series,
    parse: P,
    failure: F,
) -> std::result::Result<Vec<Option<T>>, CoercionError>
where
    P: Fn(&AnyValue<'_>) -> Option<T>,
    F: Fn(AnyValue<'_>) -> CoercionError,
{
    let mut values = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        if value.is_null() {
            values.push(None);
            continue;
        }
        match parse(&value) {
            Some(parsed) => values.push(Some(parsed)),
            None => return Err(failure(value)),
        }
    }
    Ok(values)
}

fn int_value(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Boolean(b) => Some(i64::from(b)),
        other => any_to_i64(other),
    }
}

fn float_value(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Boolean(b) => Some(if b { 1.0 } else { 0.0 }),
        other => any_to_f64(other),
    }
}

fn bool_value(value: AnyValue<'_>) -> Option<bool> {
    match value {
        AnyValue::Boolean(b) => Some(b),
        AnyValue::String(_) | AnyValue::StringOwned(_) => {
            match any_to_string(value).trim().to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            }
        }
        other => any_to_f64(other).map(|v| v != 0.0),
    }
}

fn date_value(value: &AnyValue<'_>) -> Option<NaiveDate> {
    if let AnyValue::Date(days) = value {
        return date_from_epoch_days(*days);
    }
    datetime_value(value).map(|dt| dt.date())
}

fn datetime_value(value: &AnyValue<'_>) -> Option<NaiveDateTime> {
    if let AnyValue::Date(days) = value {
        return date_from_epoch_days(*days).map(|d| d.and_time(NaiveTime::MIN));
    }
    let text = any_to_string(value.clone());
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
