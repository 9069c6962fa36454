use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::effect::{AnimationStep, Effect};
use crate::params::RenderParameters;
use crate::types::JobIndex;

/// One unit of work: an input image, the effect to apply and where the
/// clip goes.
///
/// Built by [`JobSource`](crate::job_source::JobSource) and never mutated
/// afterwards; the worker that renders it owns it exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Position in the batch (submission order).
    pub index: JobIndex,
    pub source_path: PathBuf,
    pub effect: Effect,
    pub output_path: PathBuf,
    pub parameters: RenderParameters,
}

impl Job {
    /// Animation recipe handed to the renderer.
    pub fn animation(&self) -> Vec<AnimationStep> {
        self.effect.animation(&self.parameters.camera)
    }

    /// Source file name for log lines, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}
