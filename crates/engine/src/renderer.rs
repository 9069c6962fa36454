//! Renderer interface consumed by the batch dispatcher.
//!
//! A [`Renderer`] has two phases: a one-time [`initialize`](Renderer::initialize)
//! that loads the shared resource (depth model plus post-processing stage),
//! and a synchronous [`render`](Renderer::render) invoked once per job.

use std::path::PathBuf;

use parallax_core::job::Job;
use serde::{Deserialize, Serialize};

/// Default depth estimator handed to the engine.
pub const DEFAULT_ESTIMATOR: &str = "DepthAnythingV2";
/// Default upscaler (a pass-through stage).
pub const DEFAULT_UPSCALER: &str = "NoUpscaler";
/// Default render program driven by [`CommandRenderer`](crate::command::CommandRenderer).
pub const DEFAULT_RENDER_COMMAND: &str = "depthflow-render";

/// Everything needed to build the shared render resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Program that performs renders.
    pub program: String,
    /// Fixed arguments placed before anything the renderer adds.
    pub args: Vec<String>,
    /// Depth estimator model identifier.
    pub estimator: String,
    /// Post-processing upscaler identifier.
    pub upscaler: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RENDER_COMMAND.to_string(),
            args: Vec::new(),
            estimator: DEFAULT_ESTIMATOR.to_string(),
            upscaler: DEFAULT_UPSCALER.to_string(),
        }
    }
}

/// Fatal failure while building the shared resource. No job runs after it.
#[derive(Debug, thiserror::Error)]
pub enum ResourceInitError {
    #[error("Invalid resource configuration: {0}")]
    InvalidConfig(String),

    #[error("Render engine '{program}' could not be started: {source}")]
    EngineUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Render engine probe failed (exit code {exit_code:?}): {stderr}")]
    ProbeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Resource initialization panicked: {0}")]
    Panicked(String),
}

/// Failure of a single render. Isolated to the job that produced it.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to start render engine: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Render failed (exit code {exit_code:?}): {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Render reported success but {0} was not written")]
    MissingOutput(PathBuf),

    #[error("Render panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Engine(String),
}

/// Synchronous render engine.
///
/// `render` may run for minutes and may be called from several blocking
/// threads at once, never more than the dispatcher's admitted limit.
pub trait Renderer: Send + Sync + 'static {
    /// Shared, read-only handle produced by [`initialize`](Self::initialize).
    type Resource: Send + Sync + 'static;

    /// Build the shared resource. Called exactly once, before any render.
    fn initialize(&self, config: &ResourceConfig) -> Result<Self::Resource, ResourceInitError>;

    /// Render one job against the shared resource.
    fn render(&self, resource: &Self::Resource, job: &Job) -> Result<(), RenderError>;
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
