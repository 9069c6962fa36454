//! Batch progress events.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BatchEvent`]: the envelope published for every job transition.

pub mod bus;

pub use bus::{BatchEvent, BatchEventKind, EventBus};
