//! Console progress driven by dispatcher events.

use parallax_events::{BatchEvent, BatchEventKind, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

/// Subscribe to `bus` and log `[done/total]` lines until the batch completes.
///
/// Subscribes before returning, so nothing published afterwards is missed.
/// The task resolves to the number of finished jobs it observed.
pub fn spawn(bus: &EventBus, total: usize) -> JoinHandle<usize> {
    let rx = bus.subscribe();
    tokio::spawn(report_progress(rx, total))
}

async fn report_progress(mut rx: Receiver<BatchEvent>, total: usize) -> usize {
    let mut done = 0usize;
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Progress reporter lagged; some events were dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event.kind {
            BatchEventKind::JobAdmitted { index, source, effect } => {
                tracing::info!(
                    job = index,
                    effect = %effect,
                    "[{}/{}] Processing {}",
                    index + 1,
                    total,
                    source.display(),
                );
            }
            BatchEventKind::JobSucceeded { index, output, elapsed_ms } => {
                done += 1;
                tracing::info!(
                    job = index,
                    elapsed_ms,
                    "[{done}/{total}] Rendered {}",
                    output.display(),
                );
            }
            BatchEventKind::JobFailed { index, error } => {
                done += 1;
                tracing::warn!(job = index, error = %error, "[{done}/{total}] Job failed");
            }
            BatchEventKind::BatchCompleted { .. } => break,
        }
    }
    done
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
