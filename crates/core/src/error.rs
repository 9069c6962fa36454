use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),
}

/// Batch-level failure while building the job list.
///
/// Always fatal: no job is admitted once one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    #[error("Input directory {path} is not readable: {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory {path} could not be created: {source}")]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No effects are enabled for selection")]
    NoEffectsEnabled,
}
