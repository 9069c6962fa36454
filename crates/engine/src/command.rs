//! Renderer that drives an external render program.
//!
//! Protocol, both phases:
//!
//! - `PARALLAX_MODE=probe`: the program receives the resource spec as JSON
//!   on stdin and must exit `0` once the model can be loaded. Trimmed stdout
//!   is kept as the engine version.
//! - `PARALLAX_MODE=render`: the program receives a [`RenderRequest`] as JSON
//!   on stdin, with `PARALLAX_SOURCE` and `PARALLAX_OUTPUT` also set in its
//!   environment, and must write the clip to the output path.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parallax_core::effect::{AnimationStep, Effect};
use parallax_core::job::Job;
use parallax_core::params::OutputParams;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::renderer::{RenderError, Renderer, ResourceConfig, ResourceInitError};
use crate::subprocess;

/// Environment variable selecting the protocol phase.
pub const ENV_MODE: &str = "PARALLAX_MODE";
/// Environment variable carrying the input image path during a render.
pub const ENV_SOURCE: &str = "PARALLAX_SOURCE";
/// Environment variable carrying the output clip path during a render.
pub const ENV_OUTPUT: &str = "PARALLAX_OUTPUT";

/// Model and post-processing identifiers sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub estimator: String,
    pub upscaler: String,
}

/// Shared resource for [`CommandRenderer`]: a probed engine plus the model
/// selection every render reuses.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    program: String,
    args: Vec<String>,
    spec: ResourceSpec,
    version: String,
}

impl EngineHandle {
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    /// Whatever the engine printed during the probe.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn command(&self, mode: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).env(ENV_MODE, mode);
        cmd
    }
}

/// Payload written to the engine's stdin for one render.
#[derive(Debug, Serialize)]
pub struct RenderRequest<'a> {
    pub resource: &'a ResourceSpec,
    pub source: &'a Path,
    pub output: &'a Path,
    pub effect: &'a Effect,
    pub animation: Vec<AnimationStep>,
    pub output_params: &'a OutputParams,
}

/// [`Renderer`] backed by an external program.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRenderer;

impl Renderer for CommandRenderer {
    type Resource = EngineHandle;

    fn initialize(&self, config: &ResourceConfig) -> Result<EngineHandle, ResourceInitError> {
        if config.program.trim().is_empty() {
            return Err(ResourceInitError::InvalidConfig(
                "render program must not be empty".to_string(),
            ));
        }

        let mut handle = EngineHandle {
            program: config.program.clone(),
            args: config.args.clone(),
            spec: ResourceSpec {
                estimator: config.estimator.clone(),
                upscaler: config.upscaler.clone(),
            },
            version: String::new(),
        };

        let input = serde_json::to_vec(&handle.spec)
            .map_err(|e| ResourceInitError::InvalidConfig(e.to_string()))?;

        let output = subprocess::run_command_blocking(&mut handle.command("probe"), &input).map_err(
            |source| ResourceInitError::EngineUnavailable {
                program: config.program.clone(),
                source,
            },
        )?;

        if !output.status.success() {
            return Err(ResourceInitError::ProbeFailed {
                exit_code: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        handle.version = output.stdout.trim().to_string();
        tracing::info!(
            program = %handle.program,
            estimator = %handle.spec.estimator,
            upscaler = %handle.spec.upscaler,
            version = %handle.version,
            probe_ms = output.duration.as_millis() as u64,
            "Render engine ready",
        );
        Ok(handle)
    }

    fn render(&self, resource: &EngineHandle, job: &Job) -> Result<(), RenderError> {
        let request = RenderRequest {
            resource: &resource.spec,
            source: &job.source_path,
            output: &job.output_path,
            effect: &job.effect,
            animation: job.animation(),
            output_params: &job.parameters.output,
        };
        let input = serde_json::to_vec(&request).map_err(|e| RenderError::Engine(e.to_string()))?;

        let mut cmd = resource.command("render");
        cmd.env(ENV_SOURCE, &job.source_path)
            .env(ENV_OUTPUT, &job.output_path);

        let started = SystemTime::now();
        let output =
            subprocess::run_command_blocking(&mut cmd, &input).map_err(RenderError::Spawn)?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                exit_code: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !written_since(&job.output_path, started) {
            return Err(RenderError::MissingOutput(job.output_path.clone()));
        }

        tracing::debug!(
            job = job.index,
            output = %job.output_path.display(),
            render_ms = output.duration.as_millis() as u64,
            "Engine finished render",
        );
        Ok(())
    }
}

/// Whether `path` exists and was modified at or after `since`.
///
/// Compared at whole-second resolution so coarse filesystem timestamps
/// still count a fresh write.
fn written_since(path: &Path, since: SystemTime) -> bool {
    let secs = |t: SystemTime| t.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .is_ok_and(|modified| secs(modified) >= secs(since))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
