//! Configuration model for the riskprep normalization pipeline.
//!
//! The configuration document is a nested JSON record. Every path in it is
//! optional: a stage whose path is absent degrades to a no-op instead of failing.
//!
//! - **config**: the document types and loading
//! - **enums**: enumerated strategies with their string lookup tables
//! - **validation**: an explicit validation pass reporting unknown codes
//! - **error**: configuration loading errors

pub mod config;
pub mod enums;
pub mod error;
pub mod validation;

pub use config::{
    Attributes, ColumnMap, Configuration, DataSpecificFunctions, DateColumnConfig,
    MissingValuesConfig, NullThreshold, PipelineConfig, ReplaceDirective, Separators, load_config,
};
pub use enums::{DuplicatePolicy, ImputeMethod, KeepStrategy, TargetType};
pub use error::{ConfigError, Result};
pub use validation::{ConfigIssue, IssueSeverity, has_errors};
