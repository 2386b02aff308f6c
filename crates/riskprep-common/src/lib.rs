//! Shared utilities for the riskprep crates.
//!
//! Holds the Polars `AnyValue` helpers every pipeline stage needs to read
//! heterogeneous, partially-typed columns.

pub mod polars;

pub use crate::polars::{
    any_to_f64, any_to_i64, any_to_string, any_to_string_non_empty, format_numeric,
    is_integer_dtype, is_numeric_dtype, value_key,
};
