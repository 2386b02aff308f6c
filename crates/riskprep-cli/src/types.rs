use std::path::PathBuf;
use std::time::Duration;

use riskprep_model::ConfigIssue;
use riskprep_normalization::PreprocessReport;

#[derive(Debug)]
pub struct RunResult {
    pub data: PathBuf,
    pub config: Option<PathBuf>,
    /// Whether a configuration document was found and applied.
    pub configured: bool,
    pub report: PreprocessReport,
    pub issues: Vec<ConfigIssue>,
    /// `None` on dry runs.
    pub output: Option<PathBuf>,
    pub elapsed: Duration,
}
