//! Batch worker: environment configuration, wiring and reporting around the
//! dispatch pipeline.

pub mod batch;
pub mod config;
pub mod error;
pub mod progress;
pub mod report;

pub use batch::run_batch;
pub use config::{ConfigError, WorkerConfig};
pub use error::WorkerError;
