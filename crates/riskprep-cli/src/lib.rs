//! CLI library components for the riskprep pipeline.

pub mod logging;
pub mod output;
