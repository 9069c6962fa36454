use std::sync::Arc;

use parallax_core::job_source::JobSource;
use parallax_core::selection::EffectSelector;
use parallax_engine::renderer::Renderer;
use parallax_events::EventBus;
use parallax_pipeline::{BatchDispatcher, BatchReport};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::{progress, report};

/// Run one batch end to end: enumerate, initialize, dispatch, report.
///
/// Returns `Err` only for batch-level failures. Per-job failures are in
/// the returned report.
pub async fn run_batch<R: Renderer>(config: &WorkerConfig, renderer: R) -> Result<BatchReport, WorkerError> {
    let selector = EffectSelector::new(config.selection, config.enabled_effects.clone())?;
    let mut source = JobSource::new(
        &config.output_dir,
        config.video_ext.as_str(),
        config.parameters,
        selector,
    );
    let jobs = source.enumerate(&config.input_dir)?;
    jobs.prepare_output_dir()?;
    let total = jobs.len();

    tracing::info!(
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        total,
        concurrency = config.concurrency.get(),
        "Starting batch",
    );

    let bus = Arc::new(EventBus::default());
    let mut dispatcher = BatchDispatcher::initialize(renderer, &config.resource)
        .await?
        .with_events(Arc::clone(&bus));
    let reporter = progress::spawn(&bus, total);

    dispatcher.submit_all(jobs, config.concurrency).await?;
    let batch = dispatcher.await_completion().await;

    match reporter.await {
        Ok(done) => tracing::debug!(done, "Progress reporter stopped"),
        Err(e) => tracing::warn!(error = %e, "Progress reporter ended abnormally"),
    }

    report::log_summary(&batch);
    if let Some(path) = &config.report_path {
        report::write_report(path, &batch)?;
    }
    Ok(batch)
}
