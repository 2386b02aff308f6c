//! Literal value replacement.
//!
//! Only the first directive of `replace_values`, and within it only the first
//! value/replacement pair, is applied.

use polars::prelude::*;
use riskprep_common::{any_to_f64, any_to_i64, any_to_string, is_integer_dtype, is_numeric_dtype};
use riskprep_model::PipelineConfig;
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Applies the configured replacement to its column.
///
/// A missing `replace_values` path, a directive lacking one of its keys, or
/// an absent column leaves the table unchanged. Empty lists are hard errors.
pub fn replace_values(mut df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let Some(directives) = config.replace_values() else {
        tracing::warn!("missing configuration key for value replacement: replace_values");
        return Ok(df);
    };
    let directive = directives
        .first()
        .ok_or(PipelineError::EmptyReplacementList {
            field: "replace_values",
        })?;
    let (Some(column), Some(targets), Some(replacements)) = (
        directive.column_name.as_deref(),
        directive.values_to_replace.as_deref(),
        directive.values_to_replace_with.as_deref(),
    ) else {
        let absent = directive.absent_keys().join(", ");
        tracing::warn!("missing configuration key for value replacement: {absent}");
        return Ok(df);
    };
    let target = targets.first().ok_or(PipelineError::EmptyReplacementList {
        field: "values_to_replace",
    })?;
    let replacement = replacements
        .first()
        .ok_or(PipelineError::EmptyReplacementList {
            field: "values_to_replace_with",
        })?;

    tracing::info!(column, %target, %replacement, "replacing value");

    let series = match df.column(column) {
        Ok(col) => col.as_materialized_series().clone(),
        Err(_) => {
            tracing::warn!(column, "missing column for value replacement");
            return Ok(df);
        }
    };

    if let Some(replaced) = replace_in_series(&series, target, replacement)? {
        df.with_column(replaced)?;
    }
    Ok(df)
}

/// Returns the rewritten series, or `None` when no cell matches.
pub fn replace_in_series(
    series: &Series,
    target: &Value,
    replacement: &Value,
) -> Result<Option<Series>> {
    let matches: Vec<bool> = (0..series.len())
        .map(|idx| cell_matches(&series.get(idx).unwrap_or(AnyValue::Null), target))
        .collect();
    let count = matches.iter().filter(|m| **m).count();
    if count == 0 {
        return Ok(None);
    }
    tracing::debug!(column = %series.name(), count, "matched cells");

    let name = series.name().clone();
    let dtype = series.dtype();
    let cell = |idx: usize| series.get(idx).unwrap_or(AnyValue::Null);

    let replaced = match replacement {
        Value::Null | Value::Number(_) if is_numeric_dtype(dtype) => {
            let fill = replacement.as_f64();
            let integral = replacement.is_null() || replacement.as_i64().is_some();
            if is_integer_dtype(dtype) && integral {
                let values: Vec<Option<i64>> = (0..series.len())
                    .map(|idx| {
                        if matches[idx] {
                            replacement.as_i64()
                        } else {
                            any_to_i64(cell(idx))
                        }
                    })
                    .collect();
                Series::new(name, values).cast(dtype)?
            } else {
                let values: Vec<Option<f64>> = (0..series.len())
                    .map(|idx| if matches[idx] { fill } else { any_to_f64(cell(idx)) })
                    .collect();
                let target_dtype = if is_integer_dtype(dtype) {
                    DataType::Float64
                } else {
                    dtype.clone()
                };
                Series::new(name, values).cast(&target_dtype)?
            }
        }
        Value::Null | Value::Bool(_) if dtype == &DataType::Boolean => {
            let values: Vec<Option<bool>> = (0..series.len())
                .map(|idx| {
                    if matches[idx] {
                        replacement.as_bool()
                    } else {
                        match cell(idx) {
                            AnyValue::Boolean(b) => Some(b),
                            _ => None,
                        }
                    }
                })
                .collect();
            Series::new(name, values)
        }
        _ => {
            let text = render(replacement);
            let values: Vec<Option<String>> = (0..series.len())
                .map(|idx| {
                    if matches[idx] {
                        text.clone()
                    } else {
                        let value = cell(idx);
                        (!value.is_null()).then(|| any_to_string(value))
                    }
                })
                .collect();
            Series::new(name, values)
        }
    };
    Ok(Some(replaced))
}

fn cell_matches(cell: &AnyValue<'_>, target: &Value) -> bool {
    match target {
        Value::Null => cell.is_null(),
        Value::Bool(expected) => matches!(cell, AnyValue::Boolean(b) if b == expected),
        Value::Number(number) => match cell {
            AnyValue::String(_) | AnyValue::StringOwned(_) | AnyValue::Boolean(_) => false,
            other => any_to_f64(other.clone()) == number.as_f64(),
        },
        Value::String(expected) => match cell {
            AnyValue::String(s) => s == expected,
            AnyValue::StringOwned(s) => s.as_str() == expected,
            _ => false,
        },
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
