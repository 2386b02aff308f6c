//! Configurable normalization pipeline for uploaded tabular data.
//!
//! Turns an ingested table into the canonical, typed table the risk model
//! consumes. Every stage is driven by the declarative configuration document
//! and degrades to a no-op when its configuration path is absent.
//!
//! # Overview
//!
//! - **Duplicates**: detect and remove, mark or keep-last duplicate rows
//! - **Replacement**: substitute a literal value in one column
//! - **Dates**: resolve configured date columns to canonical `YYYY-MM-DD`
//! - **Coercion**: cast columns to their configured types, column by column on failure
//! - **Missing values**: drop sparse columns and impute the rest
//!
//! # Example
//!
//! ```ignore
//! use riskprep_model::load_config;
//! use riskprep_normalization::preprocess;
//!
//! let config = load_config(Path::new("config.json"))?;
//! let canonical = preprocess(df, config.as_ref())?;
//! ```

mod coercion;
mod duplicates;
mod error;
mod missing;
mod pipeline;
mod replace;

pub mod dates;

// Errors
pub use error::{CoercionError, DateError, PipelineError, Result};

// Stages
pub use coercion::{cast_column, coerce_types};
pub use dates::{FormatRegistry, is_known_date_format, normalize_date_value, normalize_dates};
pub use duplicates::{
    DUPLICATE_FLAG_COLUMN, DuplicateOptions, duplicate_mask, resolve_duplicates,
    resolve_duplicates_in_place,
};
pub use missing::{ColumnNullStats, impute_missing_values, null_summary};
pub use replace::{replace_in_series, replace_values};

// Orchestration
pub use pipeline::{PreprocessReport, preprocess, preprocess_with_report};
