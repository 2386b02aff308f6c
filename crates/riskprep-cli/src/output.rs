//! Output location for pipeline runs.
//!
//! Each run writes into its own directory named after the wall-clock time it
//! started, so repeated runs never overwrite each other.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Prefix of every run directory.
pub const RUN_DIR_PREFIX: &str = "output_";

/// Name of the run directory for a run started at `started`.
pub fn run_directory_name(started: NaiveDateTime) -> String {
    format!("{RUN_DIR_PREFIX}{}", started.format("%Y%m%d_%H%M%S"))
}

/// `<base_dir>/output_<YYYYmmdd_HHMMSS>/<file_name>`.
pub fn run_output_path(base_dir: &Path, file_name: &str, started: NaiveDateTime) -> PathBuf {
    base_dir.join(run_directory_name(started)).join(file_name)
}
