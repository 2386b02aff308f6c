//! Missing-value remediation.
//!
//! Steps run in a fixed order, each guarded on its own configuration key:
//! drop all-null columns, drop columns above the null threshold, fill numeric
//! columns by statistic or direction, then fill the listed subset columns.
//! Failures are logged per column and never abort the stage.

use std::collections::BTreeMap;

use polars::prelude::*;
use riskprep_common::{
    any_to_f64, any_to_i64, any_to_string, format_numeric, is_integer_dtype, is_numeric_dtype,
    value_key,
};
use riskprep_model::{ImputeMethod, MissingValuesConfig, PipelineConfig};

/// Null statistics for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNullStats {
    pub column: String,
    pub null_count: usize,
    /// Share of null rows, 0 to 100. Zero for an empty table.
    pub percentage: f64,
}

/// Null count and percentage for every column, in table order.
pub fn null_summary(df: &DataFrame) -> Vec<ColumnNullStats> {
    let height = df.height();
    df.get_columns()
        .iter()
        .map(|column| {
            let null_count = column.null_count();
            ColumnNullStats {
                column: column.name().to_string(),
                null_count,
                percentage: null_percentage(null_count, height),
            }
        })
        .collect()
}

fn null_percentage(null_count: usize, height: usize) -> f64 {
    if height == 0 {
        0.0
    } else {
        null_count as f64 / height as f64 * 100.0
    }
}

/// Drops and fills missing values according to `missing_values`.
///
/// The record must carry all four of its keys; when any is absent the table
/// is returned unchanged. A `null` value only disables its own step.
pub fn impute_missing_values(mut df: DataFrame, config: &PipelineConfig) -> DataFrame {
    let summary = null_summary(&df);
    for stats in &summary {
        tracing::debug!(
            column = %stats.column,
            null_count = stats.null_count,
            percentage = stats.percentage,
            "missing values summary"
        );
    }
    let with_nulls: Vec<&str> = summary
        .iter()
        .filter(|stats| stats.null_count > 0)
        .map(|stats| stats.column.as_str())
        .collect();
    tracing::debug!(columns = ?with_nulls, "columns with missing values");

    let Some(settings) = config.missing_values() else {
        tracing::warn!("missing configuration key for missing values: missing_values");
        return df;
    };
    let absent = settings.absent_keys();
    if !absent.is_empty() {
        tracing::warn!(
            "missing configuration key for missing values: {}",
            absent.join(", ")
        );
        return df;
    }

    if settings.drop_all_nulls() {
        drop_all_null_columns(&mut df);
    }
    if let Some(threshold) = settings.null_threshold_percent() {
        drop_columns_over_threshold(&mut df, threshold);
    }

    match method(settings) {
        Some(method) if method.is_statistic() => fill_by_statistic(&mut df, method),
        Some(method) => fill_by_direction(&mut df, method),
        None => {}
    }

    if let Some(subset) = settings.subset() {
        for column in subset {
            fill_subset_column(&mut df, column);
        }
    }

    df
}

fn method(settings: &MissingValuesConfig) -> Option<ImputeMethod> {
    let name = settings.method()?;
    match name.parse() {
        Ok(method) => Some(method),
        Err(err) => {
            tracing::warn!(error = %err, "skipping numeric imputation");
            None
        }
    }
}

fn drop_all_null_columns(df: &mut DataFrame) {
    let height = df.height();
    if height == 0 {
        return;
    }
    let doomed: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| column.null_count() == height)
        .map(|column| column.name().to_string())
        .collect();
    drop_columns(df, &doomed);
    tracing::debug!(columns = ?doomed, "dropped columns with all null values");
}

/// Drops columns whose null share strictly exceeds `threshold` percent.
fn drop_columns_over_threshold(df: &mut DataFrame, threshold: f64) {
    let height = df.height();
    if height == 0 {
        return;
    }
    let doomed: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| null_percentage(column.null_count(), height) > threshold)
        .map(|column| column.name().to_string())
        .collect();
    drop_columns(df, &doomed);
    tracing::debug!(
        threshold,
        columns = ?doomed,
        "dropped columns with null percentage above threshold"
    );
}

fn drop_columns(df: &mut DataFrame, names: &[String]) {
    for name in names {
        if let Err(err) = df.drop_in_place(name) {
            tracing::error!(column = %name, error = %err, "failed to drop column");
        }
    }
}

fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| is_numeric_dtype(column.dtype()))
        .map(|column| column.name().to_string())
        .collect()
}

fn series_of(df: &DataFrame, name: &str) -> Option<Series> {
    df.column(name)
        .ok()
        .map(|column| column.as_materialized_series().clone())
}

/// Mean (rounded half to even for integer columns) or median fill.
fn fill_by_statistic(df: &mut DataFrame, method: ImputeMethod) {
    let columns = numeric_columns(df);
    tracing::debug!(columns = ?columns, "numeric columns identified");
    for name in &columns {
        let Some(series) = series_of(df, name) else {
            continue;
        };
        if series.null_count() == 0 {
            continue;
        }
        let statistic = match method {
            ImputeMethod::Mean => series.mean().map(|mean| {
                if is_integer_dtype(series.dtype()) {
                    mean.round_ties_even()
                } else {
                    mean
                }
            }),
            _ => series.median(),
        };
        let Some(fill) = statistic.filter(|value| value.is_finite()) else {
            continue;
        };
        match fill_numeric(&series, fill).and_then(|filled| replace_column(df, filled)) {
            Ok(()) => tracing::debug!(
                column = %name,
                method = %method,
                fill = %format_numeric(fill),
                "filled missing values"
            ),
            Err(err) => tracing::error!(column = %name, error = %err, "failed to impute column"),
        }
    }
}

/// Forward or backward fill of every numeric column.
fn fill_by_direction(df: &mut DataFrame, method: ImputeMethod) {
    for name in numeric_columns(df) {
        let Some(series) = series_of(df, &name) else {
            continue;
        };
        let backward = method == ImputeMethod::Bfill;
        match fill_directional(&series, backward).and_then(|filled| replace_column(df, filled)) {
            Ok(()) => tracing::debug!(column = %name, method = %method, "applied directional fill"),
            Err(err) => tracing::error!(
                column = %name,
                method = %method,
                error = %err,
                "failed to apply directional fill"
            ),
        }
    }
}

/// Fills a subset column with its mean when numeric, otherwise its mode.
fn fill_subset_column(df: &mut DataFrame, name: &str) {
    let Some(series) = series_of(df, name) else {
        tracing::error!(column = name, "subset column not found in table");
        return;
    };
    if series.null_count() == 0 {
        return;
    }

    let result = if is_numeric_dtype(series.dtype()) {
        match series.mean().filter(|mean| mean.is_finite()) {
            Some(mean) => fill_numeric(&series, mean).map(|filled| (filled, format_numeric(mean))),
            None => {
                tracing::error!(column = name, "no mean available for subset column");
                return;
            }
        }
    } else {
        match mode(&series) {
            Some(mode) => fill_with_mode(&series, &mode).map(|filled| (filled, mode)),
            None => {
                tracing::error!(column = name, "no mode available for subset column");
                return;
            }
        }
    };

    match result.and_then(|(filled, fill)| replace_column(df, filled).map(|()| fill)) {
        Ok(fill) => tracing::debug!(column = name, fill = %fill, "imputed subset column"),
        Err(err) => tracing::error!(column = name, error = %err, "failed to impute subset column"),
    }
}

fn replace_column(df: &mut DataFrame, series: Series) -> PolarsResult<()> {
    df.with_column(series)?;
    Ok(())
}

/// Fills nulls in a numeric series with `fill`.
///
/// Integer columns stay integer when `fill` is integral and become `Float64`
/// otherwise; float columns keep their width.
fn fill_numeric(series: &Series, fill: f64) -> PolarsResult<Series> {
    let name = series.name().clone();
    let dtype = series.dtype();
    if is_integer_dtype(dtype) && fill.fract() == 0.0 {
        let values: Vec<Option<i64>> = (0..series.len())
            .map(|idx| any_to_i64(series.get(idx).unwrap_or(AnyValue::Null)).or(Some(fill as i64)))
            .collect();
        return Series::new(name, values).cast(dtype);
    }
    let values: Vec<Option<f64>> = (0..series.len())
        .map(|idx| any_to_f64(series.get(idx).unwrap_or(AnyValue::Null)).or(Some(fill)))
        .collect();
    let target = if is_integer_dtype(dtype) {
        DataType::Float64
    } else {
        dtype.clone()
    };
    Series::new(name, values).cast(&target)
}

/// Carries the last seen value forward (or the next one backward).
fn fill_directional(series: &Series, backward: bool) -> PolarsResult<Series> {
    let name = series.name().clone();
    let dtype = series.dtype();
    let mut order: Vec<usize> = (0..series.len()).collect();
    if backward {
        order.reverse();
    }

    if is_integer_dtype(dtype) {
        let mut values: Vec<Option<i64>> = (0..series.len())
            .map(|idx| any_to_i64(series.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        carry(&mut values, &order);
        Series::new(name, values).cast(dtype)
    } else {
        let mut values: Vec<Option<f64>> = (0..series.len())
            .map(|idx| any_to_f64(series.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        carry(&mut values, &order);
        Series::new(name, values).cast(dtype)
    }
}

fn carry<T: Copy>(values: &mut [Option<T>], order: &[usize]) {
    let mut last = None;
    for &idx in order {
        match values[idx] {
            Some(value) => last = Some(value),
            None => values[idx] = last,
        }
    }
}

/// Most frequent non-null value; ties go to the smallest value.
fn mode(series: &Series) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for idx in 0..series.len() {
        if let Some(key) = value_key(series.get(idx).unwrap_or(AnyValue::Null)) {
            *counts.entry(key).or_default() += 1;
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn fill_with_mode(series: &Series, mode: &str) -> PolarsResult<Series> {
    let name = series.name().clone();
    let dtype = series.dtype();
    if dtype == &DataType::Boolean {
        let fill = mode == "true";
        let values: Vec<Option<bool>> = (0..series.len())
            .map(|idx| match series.get(idx).unwrap_or(AnyValue::Null) {
                AnyValue::Boolean(b) => Some(b),
                _ => Some(fill),
            })
            .collect();
        return Ok(Series::new(name, values));
    }

    let values: Vec<Option<String>> = (0..series.len())
        .map(|idx| {
            let value = series.get(idx).unwrap_or(AnyValue::Null);
            if value.is_null() {
                Some(mode.to_string())
            } else {
                Some(any_to_string(value))
            }
        })
        .collect();
    let filled = Series::new(name, values);
    if dtype == &DataType::String {
        Ok(filled)
    } else {
        filled.strict_cast(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_config(missing: serde_json::Value) -> PipelineConfig {
        PipelineConfig::from_value(json!({
            "configuration": { "data_specific_functions": { "missing_values": missing } }
        }))
        .unwrap()
    }

    /// Fills in the keys `overrides` leaves out with values that disable their step.
    fn config(overrides: serde_json::Value) -> PipelineConfig {
        let mut missing = json!({
            "method": null,
            "subset": null,
            "drop_all_nulls": false,
            "null_threshold": false
        });
        if let (Some(base), Some(overrides)) = (missing.as_object_mut(), overrides.as_object()) {
            base.extend(overrides.clone());
        }
        raw_config(missing)
    }

    #[test]
    fn summary_percentages() {
        let df = df! {
            "a" => [Some(1i64), None, None, Some(4)],
            "b" => [Some("x"), Some("y"), Some("z"), Some("w")],
        }
        .unwrap();
        let summary = null_summary(&df);
        assert_eq!(summary[0].null_count, 2);
        assert!((summary[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(summary[1].null_count, 0);
    }

    #[test]
    fn mean_rounds_integer_columns_only() {
        let df = df! {
            "int" => [Some(1i64), Some(2), None],
            "float" => [Some(1.0f64), Some(2.0), None],
        }
        .unwrap();
        let out = impute_missing_values(df, &config(json!({ "method": "mean" })));
        assert_eq!(out.column("int").unwrap().get(2).unwrap(), AnyValue::Int64(2));
        assert_eq!(out.column("float").unwrap().get(2).unwrap(), AnyValue::Float64(1.5));
    }

    #[test]
    fn median_fill_promotes_fractional_integer_fill() {
        let df = df! { "a" => [Some(1i64), Some(2), None] }.unwrap();
        let out = impute_missing_values(df, &config(json!({ "method": "median" })));
        let a = out.column("a").unwrap();
        assert_eq!(a.dtype(), &DataType::Float64);
        assert_eq!(a.get(2).unwrap(), AnyValue::Float64(1.5));
    }

    #[test]
    fn directional_fills() {
        let df = df! { "a" => [None, Some(1i64), None, Some(3), None] }.unwrap();
        let forward = impute_missing_values(df.clone(), &config(json!({ "method": "ffill" })));
        assert_eq!(forward.column("a").unwrap().null_count(), 1);
        assert_eq!(forward.column("a").unwrap().get(2).unwrap(), AnyValue::Int64(1));

        let backward = impute_missing_values(df, &config(json!({ "method": "bfill" })));
        assert_eq!(backward.column("a").unwrap().get(0).unwrap(), AnyValue::Int64(1));
        assert!(backward.column("a").unwrap().get(4).unwrap().is_null());
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        let series = Series::new("a".into(), vec![Some("b"), Some("a"), Some("b"), Some("a"), None]);
        assert_eq!(mode(&series), Some("a".to_string()));
    }

    #[test]
    fn unknown_method_still_runs_other_steps() {
        let df = df! {
            "empty" => [None::<i64>, None],
            "label" => [Some("x"), None],
        }
        .unwrap();
        let out = impute_missing_values(
            df,
            &config(json!({ "method": "mode", "drop_all_nulls": true, "subset": ["label"] })),
        );
        let names: Vec<String> = out
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["label"]);
        assert_eq!(out.column("label").unwrap().get(1).unwrap(), AnyValue::String("x"));
    }

    #[test]
    fn empty_table_keeps_columns() {
        let df = df! { "a" => Vec::<Option<i64>>::new() }.unwrap();
        let out = impute_missing_values(
            df,
            &config(json!({ "drop_all_nulls": true, "null_threshold": 10 })),
        );
        assert_eq!(out.width(), 1);
    }

    #[test]
    fn absent_key_skips_every_step() {
        let df = df! {
            "empty" => [None::<i64>, None],
            "n" => [Some(1i64), None],
        }
        .unwrap();
        let cfg = raw_config(json!({ "method": "ffill", "drop_all_nulls": true, "subset": null }));
        let out = impute_missing_values(df.clone(), &cfg);
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn null_values_disable_only_their_step() {
        let df = df! {
            "empty" => [None::<i64>, None],
            "n" => [Some(1i64), None],
        }
        .unwrap();
        let cfg = raw_config(json!({
            "method": null, "subset": null, "drop_all_nulls": true, "null_threshold": null
        }));
        let out = impute_missing_values(df, &cfg);
        assert_eq!(out.width(), 1);
        assert_eq!(out.column("n").unwrap().null_count(), 1);
    }
}
