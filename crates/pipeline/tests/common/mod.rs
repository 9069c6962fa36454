//! Shared fixtures for dispatcher integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use parallax_core::effect::EffectKind;
use parallax_core::job::Job;
use parallax_core::params::RenderParameters;
use parallax_core::types::JobIndex;
use parallax_engine::renderer::{RenderError, Renderer, ResourceConfig, ResourceInitError};

/// One recorded render call.
#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub index: JobIndex,
    pub start: Instant,
    pub end: Instant,
}

/// Observations shared between a test and its [`StubRenderer`].
#[derive(Debug, Default)]
pub struct Probe {
    pub initialized: AtomicUsize,
    pub renders: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    /// In-memory filesystem: output path -> source that last wrote it.
    files: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl Probe {
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn files(&self) -> HashMap<PathBuf, PathBuf> {
        self.files.lock().expect("files lock").clone()
    }
}

/// Decrements the active counter even when the render panics.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resource handed out by [`StubRenderer::initialize`].
#[derive(Debug)]
pub struct StubResource {
    pub estimator: String,
}

/// Instrumented renderer: sleeps, records timing and concurrency, and fails
/// or panics on demand.
#[derive(Debug, Default)]
pub struct StubRenderer {
    pub probe: Arc<Probe>,
    pub delay: Duration,
    pub delays: HashMap<JobIndex, Duration>,
    pub fail_on: HashSet<JobIndex>,
    pub panic_on: HashSet<JobIndex>,
    pub fail_init: bool,
    pub panic_init: bool,
}

impl StubRenderer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, index: JobIndex) -> Self {
        self.fail_on.insert(index);
        self
    }

    pub fn panicking_on(mut self, index: JobIndex) -> Self {
        self.panic_on.insert(index);
        self
    }

    pub fn with_delay_for(mut self, index: JobIndex, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    pub fn probe(&self) -> Arc<Probe> {
        Arc::clone(&self.probe)
    }
}

impl Renderer for StubRenderer {
    type Resource = StubResource;

    fn initialize(&self, config: &ResourceConfig) -> Result<StubResource, ResourceInitError> {
        self.probe.initialized.fetch_add(1, Ordering::SeqCst);
        if self.panic_init {
            panic!("model weights corrupt");
        }
        if self.fail_init {
            return Err(ResourceInitError::ProbeFailed {
                exit_code: Some(1),
                stderr: "CUDA unavailable".to_string(),
            });
        }
        Ok(StubResource {
            estimator: config.estimator.clone(),
        })
    }

    fn render(&self, _resource: &StubResource, job: &Job) -> Result<(), RenderError> {
        self.probe.renders.fetch_add(1, Ordering::SeqCst);
        let now_active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.probe.active);
        self.probe.max_active.fetch_max(now_active, Ordering::SeqCst);

        let start = Instant::now();
        std::thread::sleep(self.delays.get(&job.index).copied().unwrap_or(self.delay));
        let end = Instant::now();
        self.probe.calls.lock().expect("calls lock").push(Call {
            index: job.index,
            start,
            end,
        });

        if self.panic_on.contains(&job.index) {
            panic!("renderer crashed on job {}", job.index);
        }
        if self.fail_on.contains(&job.index) {
            return Err(RenderError::Engine(format!("out of VRAM on job {}", job.index)));
        }

        self.probe
            .files
            .lock()
            .expect("files lock")
            .insert(job.output_path.clone(), job.source_path.clone());
        Ok(())
    }
}

/// Build `count` jobs with distinct sources and outputs.
pub fn jobs(count: usize) -> Vec<Job> {
    (0..count)
        .map(|i| job(i, &format!("img{i}.jpg"), EffectKind::Zoom))
        .collect()
}

pub fn job(index: JobIndex, file_name: &str, effect: EffectKind) -> Job {
    let parameters = RenderParameters::default();
    let source_path = PathBuf::from("/in").join(file_name);
    let output_path = parallax_core::naming::output_path(
        PathBuf::from("/out").as_path(),
        &source_path,
        effect,
        "mp4",
    );
    Job {
        index,
        source_path,
        effect: effect.with_params(parameters.preset),
        output_path,
        parameters,
    }
}

pub fn n(value: usize) -> std::num::NonZeroUsize {
    std::num::NonZeroUsize::new(value).expect("non-zero")
}
