//! Enumerated pipeline strategies.
//!
//! The configuration document names strategies with free-form strings. Each
//! enum here owns the lookup table from those strings to a variant, so unknown
//! values can be reported by validation and skipped (with a log line) at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target type of a column cast (`configuration.attributes.dtype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit float.
    Float64,
    /// 32-bit float.
    Float32,
    /// UTF-8 text.
    String,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time (millisecond precision, no timezone).
    Datetime,
}

/// Lookup table from accepted identifiers to target types.
const TARGET_TYPE_ALIASES: &[(&str, TargetType)] = &[
    ("int", TargetType::Int64),
    ("int64", TargetType::Int64),
    ("integer", TargetType::Int64),
    ("int32", TargetType::Int32),
    ("float", TargetType::Float64),
    ("float64", TargetType::Float64),
    ("double", TargetType::Float64),
    ("float32", TargetType::Float32),
    ("string", TargetType::String),
    ("str", TargetType::String),
    ("object", TargetType::String),
    ("bool", TargetType::Boolean),
    ("boolean", TargetType::Boolean),
    ("date", TargetType::Date),
    ("datetime", TargetType::Datetime),
    ("datetime64", TargetType::Datetime),
    ("datetime64[ns]", TargetType::Datetime),
];

impl TargetType {
    /// Returns the canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Int64 => "int64",
            TargetType::Int32 => "int32",
            TargetType::Float64 => "float64",
            TargetType::Float32 => "float32",
            TargetType::String => "string",
            TargetType::Boolean => "bool",
            TargetType::Date => "date",
            TargetType::Datetime => "datetime",
        }
    }

    /// Returns true for integer targets.
    pub fn is_integer(&self) -> bool {
        matches!(self, TargetType::Int64 | TargetType::Int32)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    /// Case-insensitive lookup of a dtype identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        TARGET_TYPE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, target)| *target)
            .ok_or_else(|| format!("unknown dtype identifier '{s}'"))
    }
}

/// Missing-value remediation method (`missing_values.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImputeMethod {
    /// Fill numeric nulls with the column mean (rounded for integer columns).
    Mean,
    /// Fill numeric nulls with the column median.
    Median,
    /// Propagate the previous non-null value forward.
    Ffill,
    /// Propagate the next non-null value backward.
    Bfill,
}

const IMPUTE_METHODS: &[(&str, ImputeMethod)] = &[
    ("mean", ImputeMethod::Mean),
    ("median", ImputeMethod::Median),
    ("ffill", ImputeMethod::Ffill),
    ("bfill", ImputeMethod::Bfill),
];

impl ImputeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputeMethod::Mean => "mean",
            ImputeMethod::Median => "median",
            ImputeMethod::Ffill => "ffill",
            ImputeMethod::Bfill => "bfill",
        }
    }

    /// Returns true for the statistic-based methods (mean, median).
    pub fn is_statistic(&self) -> bool {
        matches!(self, ImputeMethod::Mean | ImputeMethod::Median)
    }

    /// Returns true for the directional fills (ffill, bfill).
    pub fn is_directional(&self) -> bool {
        matches!(self, ImputeMethod::Ffill | ImputeMethod::Bfill)
    }
}

impl fmt::Display for ImputeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImputeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        IMPUTE_METHODS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, method)| *method)
            .ok_or_else(|| format!("unknown imputation method '{s}'"))
    }
}

/// How duplicate rows are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Drop every row flagged as a duplicate.
    #[default]
    Remove,
    /// Add a boolean `is_duplicate` column instead of dropping rows.
    Mark,
    /// Drop duplicates keeping the last occurrence, whatever `keep` says.
    KeepLast,
    /// Listed as a policy but has no behavior; the table is returned unchanged.
    Count,
    /// Any other policy name; the table is returned unchanged.
    Unrecognized(String),
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            DuplicatePolicy::Remove => "remove",
            DuplicatePolicy::Mark => "mark",
            DuplicatePolicy::KeepLast => "keep_last",
            DuplicatePolicy::Count => "count",
            DuplicatePolicy::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for DuplicatePolicy {
    fn from(value: &str) -> Self {
        match value.trim() {
            "remove" => DuplicatePolicy::Remove,
            "mark" => DuplicatePolicy::Mark,
            "keep_last" => DuplicatePolicy::KeepLast,
            "count" => DuplicatePolicy::Count,
            other => DuplicatePolicy::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which occurrence of a duplicated row survives detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeepStrategy {
    /// The first occurrence is kept; later ones are duplicates.
    #[default]
    First,
    /// The last occurrence is kept; earlier ones are duplicates.
    Last,
    /// Every occurrence of a repeated row is a duplicate.
    None,
}

impl KeepStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeepStrategy::First => "first",
            KeepStrategy::Last => "last",
            KeepStrategy::None => "false",
        }
    }
}

impl fmt::Display for KeepStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KeepStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(KeepStrategy::First),
            "last" => Ok(KeepStrategy::Last),
            "false" | "none" => Ok(KeepStrategy::None),
            _ => Err(format!("unknown keep strategy '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_type_aliases() {
        assert_eq!("int".parse::<TargetType>(), Ok(TargetType::Int64));
        assert_eq!("Float".parse::<TargetType>(), Ok(TargetType::Float64));
        assert_eq!("object".parse::<TargetType>(), Ok(TargetType::String));
        assert_eq!(
            "datetime64[ns]".parse::<TargetType>(),
            Ok(TargetType::Datetime)
        );
        assert!("banana".parse::<TargetType>().is_err());
    }

    #[test]
    fn impute_method_lookup() {
        assert_eq!("median".parse::<ImputeMethod>(), Ok(ImputeMethod::Median));
        assert!(ImputeMethod::Mean.is_statistic());
        assert!(ImputeMethod::Bfill.is_directional());
        assert!("mode".parse::<ImputeMethod>().is_err());
    }

    #[test]
    fn duplicate_policy_keeps_unknown_names() {
        assert_eq!(DuplicatePolicy::from("keep_last"), DuplicatePolicy::KeepLast);
        assert_eq!(DuplicatePolicy::from("count"), DuplicatePolicy::Count);
        assert_eq!(
            DuplicatePolicy::from("squash"),
            DuplicatePolicy::Unrecognized("squash".to_string())
        );
        assert_eq!(DuplicatePolicy::default(), DuplicatePolicy::Remove);
    }

    #[test]
    fn keep_strategy_accepts_false() {
        assert_eq!("false".parse::<KeepStrategy>(), Ok(KeepStrategy::None));
        assert_eq!("LAST".parse::<KeepStrategy>(), Ok(KeepStrategy::Last));
        assert!("middle".parse::<KeepStrategy>().is_err());
    }
}
