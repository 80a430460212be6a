//! Run several reports in parallel with per-report failure isolation

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, warn};

use crate::services::catalog::ReportDefinition;
use crate::services::runner::ReportRunner;
use crate::types::ReportOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Written(PathBuf),
    NoData,
    Failed(String),
}

impl BatchStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchStatus::Failed(_))
    }
}

/// Generate every report; results keep the input order.
/// One report failing does not stop the others.
pub fn run_all(
    runner: &ReportRunner<'_>,
    reports: &[ReportDefinition],
    output_dir: &Path,
) -> Vec<(String, BatchStatus)> {
    reports
        .par_iter()
        .map(|def| {
            let status = match runner.generate(def, output_dir) {
                Ok(ReportOutcome::Ready(path)) => BatchStatus::Written(path),
                Ok(ReportOutcome::NoData) => BatchStatus::NoData,
                Err(e) => {
                    if e.is_data_error() {
                        error!(report = %def.id, error = %e, "malformed upstream data");
                    } else {
                        warn!(report = %def.id, error = %e, "report failed");
                    }
                    BatchStatus::Failed(e.to_string())
                }
            };
            (def.id.clone(), status)
        })
        .collect()
}
