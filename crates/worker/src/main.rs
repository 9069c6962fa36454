//! `parallax-worker` -- renders every image in a directory into a short
//! parallax clip with a randomly chosen camera effect.
//!
//! Configuration is read from the environment (and `.env`); see
//! [`WorkerConfig::from_env`]. Exits 1 on a batch-level failure (bad
//! configuration, unreadable input, renderer setup), 0 otherwise, even
//! when individual jobs failed.

use parallax_engine::CommandRenderer;
use parallax_worker::{run_batch, WorkerConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parallax_worker=info,parallax_pipeline=info,parallax_engine=info,parallax_core=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        program = %config.resource.program,
        effects = ?config.enabled_effects,
        selection = ?config.selection,
        "Starting parallax-worker",
    );

    match run_batch(&config, CommandRenderer).await {
        Ok(report) if !report.is_complete_success() => {
            tracing::warn!(failed = report.failed(), "Batch completed with failures");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "Batch aborted");
            std::process::exit(1);
        }
    }
}
