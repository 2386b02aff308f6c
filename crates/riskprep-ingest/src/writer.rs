//! Writing the canonical table.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Writes `df` as comma-separated text with a header row.
///
/// Missing parent directories are created.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    CsvWriter::new(file).include_header(true).finish(df)?;

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote table"
    );
    Ok(())
}
