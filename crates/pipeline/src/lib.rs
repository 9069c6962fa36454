//! Batch dispatch core.
//!
//! Admits jobs through a bounded [`AdmissionGate`], renders each on its
//! own worker against one shared resource, isolates per-job failures and
//! joins every worker at a completion barrier.

pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod outcome;

pub use dispatcher::BatchDispatcher;
pub use error::DispatchError;
pub use gate::{AdmissionGate, AdmissionPermit};
pub use outcome::{BatchOutcome, BatchReport, OutcomeStatus};
