use std::path::PathBuf;

use parallax_core::error::EnumerationError;
use parallax_engine::renderer::ResourceInitError;
use parallax_pipeline::DispatchError;

use crate::config::ConfigError;

/// Batch-level failure. Any of these ends the process with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error("Render resource initialization failed: {0}")]
    ResourceInit(#[from] ResourceInitError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode report: {0}")]
    ReportEncode(#[from] serde_json::Error),
}
