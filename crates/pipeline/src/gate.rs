//! Admission control for concurrent renders.
//!
//! [`AdmissionGate`] is a counting semaphore with a fixed capacity. A slot
//! is held for as long as its [`AdmissionPermit`] is alive and is returned
//! when the permit drops, on every exit path including unwinding.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::DispatchError;

/// Bounded-concurrency limiter shared by the submitter and its workers.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: NonZeroUsize,
}

/// One occupied slot of an [`AdmissionGate`].
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots.
    ///
    /// Capacities above [`Semaphore::MAX_PERMITS`] are clamped.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let permits = capacity.get().min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            capacity,
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Occupied slots right now.
    pub fn in_use(&self) -> usize {
        self.capacity
            .get()
            .min(Semaphore::MAX_PERMITS)
            .saturating_sub(self.available())
    }

    /// No slot is held.
    pub fn is_idle(&self) -> bool {
        self.in_use() == 0
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<AdmissionPermit, DispatchError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::GateClosed)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gate(n: usize) -> AdmissionGate {
        AdmissionGate::new(NonZeroUsize::new(n).expect("non-zero"))
    }

    #[test]
    fn counts_slots() {
        let gate = gate(2);
        assert!(gate.is_idle());

        let a = gate.try_acquire().expect("first slot");
        let b = gate.try_acquire().expect("second slot");
        assert_eq!(gate.in_use(), 2);
        assert!(gate.try_acquire().is_none());

        drop(a);
        assert_eq!(gate.available(), 1);
        drop(b);
        assert!(gate.is_idle());
    }

    #[test]
    fn permit_released_on_unwind() {
        let gate = gate(1);
        let permit = gate.try_acquire().expect("slot");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = permit;
            panic!("render blew up");
        }));
        assert!(result.is_err());
        assert!(gate.is_idle());
    }

    #[tokio::test]
    async fn acquire_waits_for_release() {
        let gate = gate(1);
        let held = gate.acquire().await.expect("slot");

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.expect("join").expect("acquired");
        assert!(gate.is_idle());
    }

    #[test]
    fn clones_share_slots() {
        let a = gate(1);
        let b = a.clone();
        let _held = a.try_acquire().expect("slot");
        assert!(b.try_acquire().is_none());
        assert_eq!(b.capacity().get(), 1);
    }
}
