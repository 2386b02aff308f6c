//! Configuration validation.
//!
//! The pipeline tolerates unknown codes at runtime (it logs and skips them).
//! This pass reports them up front so callers can reject a document before
//! any data is touched.

use std::fmt;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::enums::{ImputeMethod, TargetType};

/// Severity of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueSeverity {
    /// The document names something the pipeline cannot act on.
    Error,
    /// The document is usable but part of it will be ignored.
    Warning,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One problem found in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    /// Dotted path of the offending entry.
    pub path: String,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ConfigIssue {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.severity)
    }
}

/// Returns true when any issue is an error.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues
        .iter()
        .any(|issue| issue.severity == IssueSeverity::Error)
}

const DTYPE_PATH: &str = "configuration.attributes.dtype";
const FUNCTIONS_PATH: &str = "configuration.data_specific_functions";

impl PipelineConfig {
    /// Checks every configured code against the known catalogs.
    ///
    /// `is_known_date_format` decides whether a `date_format` value names a
    /// registered encoding; the catalog lives with the date normalizer.
    pub fn validate(&self, is_known_date_format: impl Fn(&str) -> bool) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if let Some(dtype) = self.dtype() {
            for (column, identifier) in dtype.iter() {
                if identifier.parse::<TargetType>().is_err() {
                    issues.push(ConfigIssue::error(
                        format!("{DTYPE_PATH}.{column}"),
                        format!("unknown dtype identifier '{identifier}'"),
                    ));
                }
            }
        }

        if let Some(date_columns) = self.date_columns() {
            for (column, entry) in date_columns.iter() {
                let path = format!("{FUNCTIONS_PATH}.date_columns.{column}.date_format");
                match entry.date_format.as_deref() {
                    None => issues.push(ConfigIssue::error(path, "date_format is missing")),
                    Some(code) if !is_known_date_format(code) => issues.push(ConfigIssue::error(
                        path,
                        format!("unknown date format '{code}'"),
                    )),
                    Some(_) => {}
                }
            }
        }

        if let Some(directives) = self.replace_values() {
            let path = format!("{FUNCTIONS_PATH}.replace_values");
            match directives.first() {
                None => issues.push(ConfigIssue::error(path.clone(), "no replacement directives")),
                Some(first) => {
                    for key in first.absent_keys() {
                        issues.push(ConfigIssue::warning(
                            format!("{path}[0].{key}"),
                            "key is missing; replacement is skipped",
                        ));
                    }
                    let values = first.values_to_replace.as_deref();
                    let replacements = first.values_to_replace_with.as_deref();
                    if values.is_some_and(<[_]>::is_empty) {
                        issues.push(ConfigIssue::error(
                            format!("{path}[0].values_to_replace"),
                            "list is empty",
                        ));
                    }
                    if replacements.is_some_and(<[_]>::is_empty) {
                        issues.push(ConfigIssue::error(
                            format!("{path}[0].values_to_replace_with"),
                            "list is empty",
                        ));
                    }
                    if values.is_some_and(|v| v.len() > 1)
                        || replacements.is_some_and(|v| v.len() > 1)
                    {
                        issues.push(ConfigIssue::warning(
                            format!("{path}[0]"),
                            "only the first value/replacement pair is applied",
                        ));
                    }
                }
            }
            if directives.len() > 1 {
                issues.push(ConfigIssue::warning(
                    path,
                    format!(
                        "only the first of {} directives is applied",
                        directives.len()
                    ),
                ));
            }
        }

        if let Some(missing) = self.missing_values() {
            let path = format!("{FUNCTIONS_PATH}.missing_values");
            for key in missing.absent_keys() {
                issues.push(ConfigIssue::warning(
                    format!("{path}.{key}"),
                    "key is missing; missing-value handling is skipped",
                ));
            }
            if let Some(method) = missing.method()
                && method.parse::<ImputeMethod>().is_err()
            {
                issues.push(ConfigIssue::error(
                    format!("{path}.method"),
                    format!("unknown imputation method '{method}'"),
                ));
            }
            if let Some(percent) = missing.null_threshold_percent()
                && !(0.0..=100.0).contains(&percent)
            {
                issues.push(ConfigIssue::error(
                    format!("{path}.null_threshold"),
                    format!("threshold {percent} is outside 0-100"),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn known(code: &str) -> bool {
        matches!(code, "ISO8601" | "%Y-%m-%d" | "XMYYYY")
    }

    #[test]
    fn clean_document_has_no_issues() {
        let config = PipelineConfig::from_value(json!({
            "configuration": {
                "attributes": { "dtype": { "a": "int" } },
                "data_specific_functions": {
                    "date_columns": { "d": { "date_format": "XMYYYY" } },
                    "missing_values": {
                        "method": "median",
                        "subset": null,
                        "drop_all_nulls": false,
                        "null_threshold": 50
                    }
                }
            }
        }))
        .unwrap();
        assert!(config.validate(known).is_empty());
    }

    #[test]
    fn reports_unknown_codes() {
        let config = PipelineConfig::from_value(json!({
            "configuration": {
                "attributes": { "dtype": { "a": "decimal" } },
                "data_specific_functions": {
                    "date_columns": { "d": { "date_format": "banana" }, "e": {} },
                    "missing_values": {
                        "method": "mode",
                        "subset": [],
                        "drop_all_nulls": true,
                        "null_threshold": 140
                    }
                }
            }
        }))
        .unwrap();
        let issues = config.validate(known);
        let paths: Vec<&str> = issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "configuration.attributes.dtype.a",
                "configuration.data_specific_functions.date_columns.d.date_format",
                "configuration.data_specific_functions.date_columns.e.date_format",
                "configuration.data_specific_functions.missing_values.method",
                "configuration.data_specific_functions.missing_values.null_threshold",
            ]
        );
        assert!(has_errors(&issues));
    }

    #[test]
    fn extra_replacements_are_warnings() {
        let config = PipelineConfig::from_value(json!({
            "configuration": { "data_specific_functions": { "replace_values": [
                { "column_name": "a", "values_to_replace": [1, 2], "values_to_replace_with": [0, 0] },
                { "column_name": "b", "values_to_replace": [3], "values_to_replace_with": [4] }
            ] } }
        }))
        .unwrap();
        let issues = config.validate(known);
        assert_eq!(issues.len(), 2);
        assert!(!has_errors(&issues));
    }

    #[test]
    fn empty_directive_list_is_an_error() {
        let config = PipelineConfig::from_value(json!({
            "configuration": { "data_specific_functions": { "replace_values": [] } }
        }))
        .unwrap();
        let issues = config.validate(known);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "configuration.data_specific_functions.replace_values");
        assert!(has_errors(&issues));
    }

    #[test]
    fn absent_keys_are_warnings_and_empty_lists_errors() {
        let config = PipelineConfig::from_value(json!({
            "configuration": { "data_specific_functions": {
                "replace_values": [ { "values_to_replace": [] } ],
                "missing_values": { "method": "mean" }
            } }
        }))
        .unwrap();
        let issues = config.validate(known);
        let summary: Vec<(&str, IssueSeverity)> = issues
            .iter()
            .map(|issue| (issue.path.as_str(), issue.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "configuration.data_specific_functions.replace_values[0].column_name",
                    IssueSeverity::Warning
                ),
                (
                    "configuration.data_specific_functions.replace_values[0].values_to_replace_with",
                    IssueSeverity::Warning
                ),
                (
                    "configuration.data_specific_functions.replace_values[0].values_to_replace",
                    IssueSeverity::Error
                ),
                (
                    "configuration.data_specific_functions.missing_values.subset",
                    IssueSeverity::Warning
                ),
                (
                    "configuration.data_specific_functions.missing_values.drop_all_nulls",
                    IssueSeverity::Warning
                ),
                (
                    "configuration.data_specific_functions.missing_values.null_threshold",
                    IssueSeverity::Warning
                ),
            ]
        );
    }
}
