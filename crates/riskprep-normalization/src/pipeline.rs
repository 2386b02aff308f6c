//! Pipeline orchestration.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use riskprep_model::PipelineConfig;
use serde::Serialize;
use tracing::{error, info, info_span};

use crate::coercion::coerce_types;
use crate::duplicates::{DuplicateOptions, resolve_duplicates};
use crate::error::Result;
use crate::missing::impute_missing_values;
use crate::replace::replace_values;

/// Shape changes made by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Input columns no longer present, in input order.
    pub columns_dropped: Vec<String>,
    /// Output columns not present in the input, in output order.
    pub columns_added: Vec<String>,
}

impl PreprocessReport {
    fn new(input: &[String], output: &DataFrame, rows_before: usize) -> Self {
        let output_names = column_names(output);
        let input_set: BTreeSet<&str> = input.iter().map(String::as_str).collect();
        let output_set: BTreeSet<&str> = output_names.iter().map(String::as_str).collect();
        Self {
            rows_before,
            rows_after: output.height(),
            columns_before: input.len(),
            columns_after: output_names.len(),
            columns_dropped: input
                .iter()
                .filter(|name| !output_set.contains(name.as_str()))
                .cloned()
                .collect(),
            columns_added: output_names
                .iter()
                .filter(|name| !input_set.contains(name.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

/// Runs the pipeline and returns the canonical table.
///
/// Duplicate rows are always removed. With a configuration, value
/// replacement, type coercion (including date normalization) and
/// missing-value remediation follow, in that order.
pub fn preprocess(df: DataFrame, config: Option<&PipelineConfig>) -> Result<DataFrame> {
    preprocess_with_report(df, config).map(|(df, _)| df)
}

/// Runs the pipeline and also reports the shape changes it made.
pub fn preprocess_with_report(
    df: DataFrame,
    config: Option<&PipelineConfig>,
) -> Result<(DataFrame, PreprocessReport)> {
    let span = info_span!("preprocess", configured = config.is_some());
    let _guard = span.enter();

    info!(rows = df.height(), columns = df.width(), "starting data preprocessing pipeline");
    let input_columns = column_names(&df);
    let rows_before = df.height();

    let result = run_stages(df, config);
    match result {
        Ok(df) => {
            let (rows, columns) = df.shape();
            info!(rows, columns, "preprocessing complete");
            let report = PreprocessReport::new(&input_columns, &df, rows_before);
            Ok((df, report))
        }
        Err(err) => {
            error!(error = %err, "error in preprocessing pipeline");
            Err(err)
        }
    }
}

fn run_stages(df: DataFrame, config: Option<&PipelineConfig>) -> Result<DataFrame> {
    info!("handling duplicates");
    let df = resolve_duplicates(df, &DuplicateOptions::default())?;

    let Some(config) = config else {
        return Ok(df);
    };

    info!("handling value replacements");
    let df = replace_values(df, config)?;

    info!("converting column data types");
    let df = coerce_types(df, config)?;

    info!("handling missing values");
    Ok(impute_missing_values(df, config))
}
