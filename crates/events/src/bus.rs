//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`BatchEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the dispatcher and
//! whatever reports progress.

use std::path::PathBuf;

use chrono::Utc;
use parallax_core::effect::EffectKind;
use parallax_core::types::{JobIndex, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BatchEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEventKind {
    /// The job took a gate slot and its worker was spawned.
    JobAdmitted {
        index: JobIndex,
        source: PathBuf,
        effect: EffectKind,
    },
    JobSucceeded {
        index: JobIndex,
        output: PathBuf,
        elapsed_ms: u64,
    },
    JobFailed {
        index: JobIndex,
        error: String,
    },
    /// Every worker has been joined.
    BatchCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

/// A progress event for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEvent {
    /// Batch the event belongs to.
    pub batch_id: Uuid,
    #[serde(flatten)]
    pub kind: BatchEventKind,
    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl BatchEvent {
    pub fn new(batch_id: Uuid, kind: BatchEventKind) -> Self {
        Self {
            batch_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use parallax_events::bus::{BatchEvent, BatchEventKind, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(BatchEvent::new(
///     uuid::Uuid::nil(),
///     BatchEventKind::BatchCompleted { total: 0, succeeded: 0, failed: 0 },
/// ));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<BatchEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: BatchEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
