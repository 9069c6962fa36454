use std::path::Path;

use parallax_pipeline::BatchReport;

use crate::error::WorkerError;

/// Write `report` as pretty-printed JSON to `path`.
pub fn write_report(path: &Path, report: &BatchReport) -> Result<(), WorkerError> {
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, json).map_err(|source| WorkerError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Batch report written");
    Ok(())
}

/// Log the final tally and one line per failed job.
pub fn log_summary(report: &BatchReport) {
    for failure in report.failures() {
        tracing::warn!(
            job = failure.index,
            source = %failure.source_path.display(),
            effect = %failure.effect,
            error = failure.error().unwrap_or_default(),
            "Failed",
        );
    }
    tracing::info!(
        total = report.total(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch finished",
    );
}
