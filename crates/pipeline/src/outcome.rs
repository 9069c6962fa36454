//! Per-job outcomes and the batch report.

use std::path::PathBuf;

use parallax_core::effect::EffectKind;
use parallax_core::job::Job;
use parallax_core::types::{JobIndex, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed { error: String },
}

/// Terminal record for one submitted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub index: JobIndex,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub effect: EffectKind,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// When the render call began; `None` if it never reported back.
    pub started_at: Option<Timestamp>,
    pub finished_at: Timestamp,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded)
    }

    /// Error detail for a failed job.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed { error } => Some(error),
        }
    }

    /// Wall-clock time of the render call.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.started_at.map(|start| self.finished_at - start)
    }
}

/// Identity of a submitted job, kept by the dispatcher until its outcome
/// arrives.
#[derive(Debug, Clone)]
pub(crate) struct JobTicket {
    pub index: JobIndex,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub effect: EffectKind,
}

impl JobTicket {
    pub fn new(job: &Job) -> Self {
        Self {
            index: job.index,
            source_path: job.source_path.clone(),
            output_path: job.output_path.clone(),
            effect: job.effect.kind(),
        }
    }

    pub fn into_outcome(
        self,
        status: OutcomeStatus,
        started_at: Option<Timestamp>,
        finished_at: Timestamp,
    ) -> BatchOutcome {
        BatchOutcome {
            index: self.index,
            source_path: self.source_path,
            output_path: self.output_path,
            effect: self.effect,
            status,
            started_at,
            finished_at,
        }
    }
}

/// Outcomes of a whole batch, one per submitted job, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}
