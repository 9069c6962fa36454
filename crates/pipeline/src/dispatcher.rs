//! Concurrency-bounded batch dispatcher.
//!
//! Two-phase API:
//!
//! 1. [`BatchDispatcher::initialize`] builds the shared render resource
//!    once. If it fails nothing else runs.
//! 2. [`submit_all`](BatchDispatcher::submit_all) admits jobs through an
//!    [`AdmissionGate`], spawning one worker per admitted job, and
//!    [`await_completion`](BatchDispatcher::await_completion) joins every
//!    worker and returns one outcome per job in submission order.
//!
//! Each worker runs the synchronous render on the blocking pool. The gate
//! permit moves into the blocking closure, so the slot frees exactly when
//! the render returns or unwinds. Render errors and panics become a failed
//! [`BatchOutcome`] for that job only.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::Utc;
use parallax_core::job::Job;
use parallax_engine::renderer::{panic_message, RenderError, Renderer, ResourceConfig, ResourceInitError};
use parallax_events::{BatchEvent, BatchEventKind, EventBus};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::gate::{AdmissionGate, AdmissionPermit};
use crate::outcome::{BatchOutcome, BatchReport, JobTicket, OutcomeStatus};

/// Runs a batch of jobs against one shared render resource.
pub struct BatchDispatcher<R: Renderer> {
    /// Id of the batch being collected; replaced after every completion.
    batch_id: Uuid,
    renderer: Arc<R>,
    resource: Arc<R::Resource>,
    /// Fixed by the first `submit_all` call.
    gate: Option<AdmissionGate>,
    workers: JoinSet<(usize, BatchOutcome)>,
    /// Submitted jobs, indexed by submission slot.
    tickets: Vec<JobTicket>,
    events: Option<Arc<EventBus>>,
}

impl<R: Renderer> BatchDispatcher<R> {
    /// Build the shared resource and return a dispatcher ready for jobs.
    ///
    /// The renderer's setup runs on the blocking pool; a panic there is
    /// reported as [`ResourceInitError::Panicked`]. Never retried.
    pub async fn initialize(renderer: R, config: &ResourceConfig) -> Result<Self, ResourceInitError> {
        let renderer = Arc::new(renderer);
        let setup = Arc::clone(&renderer);
        let config = config.clone();

        tracing::info!(
            program = %config.program,
            estimator = %config.estimator,
            upscaler = %config.upscaler,
            "Initializing render resource",
        );

        let resource = tokio::task::spawn_blocking(move || setup.initialize(&config))
            .await
            .map_err(|e| ResourceInitError::Panicked(join_error_message(e)))??;

        Ok(Self {
            batch_id: Uuid::now_v7(),
            renderer,
            resource: Arc::new(resource),
            gate: None,
            workers: JoinSet::new(),
            tickets: Vec::new(),
            events: None,
        })
    }

    /// Publish progress events to `bus`.
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Id stamped on the events and report of the current batch.
    ///
    /// Each [`await_completion`](Self::await_completion) closes the batch
    /// and starts a new one with a fresh id.
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// The shared resource built by [`initialize`](Self::initialize).
    pub fn resource(&self) -> &R::Resource {
        &self.resource
    }

    /// The admission gate, once the first submission fixed its capacity.
    pub fn gate(&self) -> Option<&AdmissionGate> {
        self.gate.as_ref()
    }

    /// Workers spawned and not yet joined.
    pub fn in_flight(&self) -> usize {
        self.workers.len()
    }

    /// Admit every job in order, spawning a worker for each.
    ///
    /// Blocks the caller (not the workers) while all `concurrency` slots are
    /// taken. The first call fixes the gate capacity; later calls must pass
    /// the same value. Returns the number of jobs admitted by this call.
    pub async fn submit_all<I>(&mut self, jobs: I, concurrency: NonZeroUsize) -> Result<usize, DispatchError>
    where
        I: IntoIterator<Item = Job>,
    {
        let gate = match &self.gate {
            Some(gate) if gate.capacity() != concurrency => {
                return Err(DispatchError::ConcurrencyMismatch {
                    configured: gate.capacity(),
                    requested: concurrency,
                });
            }
            Some(gate) => gate.clone(),
            None => {
                let gate = AdmissionGate::new(concurrency);
                self.gate = Some(gate.clone());
                gate
            }
        };

        let mut admitted = 0;
        for job in jobs {
            let permit = gate.acquire().await?;
            self.spawn_worker(job, permit);
            admitted += 1;
        }
        Ok(admitted)
    }

    /// Completion barrier: wait for every worker and collect the outcomes.
    ///
    /// Returns exactly one outcome per submitted job, in submission order.
    /// A worker that ends without reporting still yields a failed outcome.
    pub async fn await_completion(&mut self) -> BatchReport {
        let mut slots: Vec<Option<BatchOutcome>> = (0..self.tickets.len()).map(|_| None).collect();

        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok((slot, outcome)) => {
                    if let Some(entry) = slots.get_mut(slot) {
                        *entry = Some(outcome);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Worker task terminated abnormally");
                }
            }
        }

        let outcomes: Vec<BatchOutcome> = slots
            .into_iter()
            .zip(self.tickets.drain(..))
            .map(|(outcome, ticket)| {
                outcome.unwrap_or_else(|| {
                    ticket.into_outcome(
                        OutcomeStatus::Failed {
                            error: "worker terminated without reporting an outcome".to_string(),
                        },
                        None,
                        Utc::now(),
                    )
                })
            })
            .collect();

        let report = BatchReport {
            batch_id: self.batch_id,
            outcomes,
        };

        debug_assert!(self.gate.as_ref().is_none_or(AdmissionGate::is_idle));

        tracing::info!(
            batch_id = %self.batch_id,
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch complete",
        );
        self.publish(BatchEventKind::BatchCompleted {
            total: report.total(),
            succeeded: report.succeeded(),
            failed: report.failed(),
        });

        self.batch_id = Uuid::now_v7();
        report
    }

    /// Submit `jobs` and wait for all of them.
    pub async fn run<I>(&mut self, jobs: I, concurrency: NonZeroUsize) -> Result<BatchReport, DispatchError>
    where
        I: IntoIterator<Item = Job>,
    {
        self.submit_all(jobs, concurrency).await?;
        Ok(self.await_completion().await)
    }

    fn spawn_worker(&mut self, job: Job, permit: AdmissionPermit) {
        let slot = self.tickets.len();
        let ticket = JobTicket::new(&job);
        self.tickets.push(ticket.clone());

        tracing::info!(
            job = job.index,
            source = %job.display_name(),
            effect = %job.effect.name(),
            output = %job.output_path.display(),
            "Job admitted",
        );
        self.publish(BatchEventKind::JobAdmitted {
            index: job.index,
            source: job.source_path.clone(),
            effect: job.effect.kind(),
        });

        let renderer = Arc::clone(&self.renderer);
        let resource = Arc::clone(&self.resource);
        let events = self.events.clone();
        let batch_id = self.batch_id;
        let span = tracing::info_span!("render_job", job = job.index);

        self.workers.spawn(
            async move {
                let render = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    let started_at = Utc::now();
                    let result = renderer.render(&resource, &job);
                    (started_at, result)
                });

                let (status, started_at) = match render.await {
                    Ok((started_at, Ok(()))) => (OutcomeStatus::Succeeded, Some(started_at)),
                    Ok((started_at, Err(e))) => (
                        OutcomeStatus::Failed { error: e.to_string() },
                        Some(started_at),
                    ),
                    Err(e) => (
                        OutcomeStatus::Failed {
                            error: RenderError::Panicked(join_error_message(e)).to_string(),
                        },
                        None,
                    ),
                };
                let outcome = ticket.into_outcome(status, started_at, Utc::now());
                report_outcome(&outcome, events.as_deref(), batch_id);
                (slot, outcome)
            }
            .instrument(span),
        );
    }

    fn publish(&self, kind: BatchEventKind) {
        if let Some(bus) = &self.events {
            bus.publish(BatchEvent::new(self.batch_id, kind));
        }
    }
}

fn report_outcome(outcome: &BatchOutcome, events: Option<&EventBus>, batch_id: Uuid) {
    let kind = match &outcome.status {
        OutcomeStatus::Succeeded => {
            let elapsed_ms = outcome
                .elapsed()
                .and_then(|d| u64::try_from(d.num_milliseconds()).ok())
                .unwrap_or(0);
            tracing::info!(
                job = outcome.index,
                output = %outcome.output_path.display(),
                elapsed_ms,
                "Render finished",
            );
            BatchEventKind::JobSucceeded {
                index: outcome.index,
                output: outcome.output_path.clone(),
                elapsed_ms,
            }
        }
        OutcomeStatus::Failed { error } => {
            tracing::warn!(
                job = outcome.index,
                source = %outcome.source_path.display(),
                error = %error,
                "Render failed",
            );
            BatchEventKind::JobFailed {
                index: outcome.index,
                error: error.clone(),
            }
        }
    };
    if let Some(bus) = events {
        bus.publish(BatchEvent::new(batch_id, kind));
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(&*err.into_panic())
    } else {
        err.to_string()
    }
}
