use std::num::NonZeroUsize;

/// Submission-side failure of [`BatchDispatcher`](crate::dispatcher::BatchDispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Concurrency already fixed at {configured} for this dispatcher, got {requested}")]
    ConcurrencyMismatch {
        configured: NonZeroUsize,
        requested: NonZeroUsize,
    },

    #[error("Admission gate closed")]
    GateClosed,
}
