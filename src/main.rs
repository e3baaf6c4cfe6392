//! motion-har dry run - Main Entry Point
//!
//! Runs the full pipeline against the simulated sensor and model so a
//! configuration can be checked end to end without hardware.
//!
//! Usage: `motion-har [CONFIG] [SECONDS]`
//!
//! Set `MOTION_HAR_LOG_DIR` to also write a daily rolling log file.

use anyhow::Context;
use motion_har::{
    config::{default_config_path, PipelineConfig},
    inference::MockModel,
    pipeline::PipelineBuilder,
    sensor::MockSensorSource,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_RUN_SECS: u64 = 10;
const LOG_DIR_ENV: &str = "MOTION_HAR_LOG_DIR";

fn main() -> anyhow::Result<()> {
    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from).or_else(default_config_path);
    let run_for = match args.next() {
        Some(secs) => Duration::from_secs(
            secs.parse()
                .with_context(|| format!("Invalid run duration '{}'", secs))?,
        ),
        None => Duration::from_secs(DEFAULT_RUN_SECS),
    };

    let config = match &config_path {
        Some(path) if path.exists() => {
            tracing::info!("Loading pipeline config from {:?}", path);
            PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?
        }
        Some(path) => {
            tracing::info!("No config at {:?}, using defaults", path);
            PipelineConfig::default()
        }
        None => PipelineConfig::default(),
    };
    let labels = config.labels.len();

    let mut pipeline = PipelineBuilder::new(config)
        .source(MockSensorSource::walking())
        .invoker(MockModel::rotating(labels))
        .build()
        .context("Failed to build pipeline")?;
    let updates = pipeline.subscribe();

    pipeline.run().context("Failed to start pipeline")?;
    tracing::info!("Running for {:?}", run_for);

    let deadline = Instant::now() + run_for;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match updates.recv_timeout(remaining) {
            Ok(set) => {
                if let Some(top) = set.top() {
                    tracing::info!(
                        "Tick {}: {} ({:.3}) of {} classes",
                        set.tick,
                        top.label,
                        top.confidence,
                        set.len()
                    );
                }
            }
            // Timed out or the pipeline went away
            Err(_) => break,
        }
    }

    pipeline.stop();
    let stats = pipeline.stats();
    tracing::info!(
        "Stats: {} samples pushed, {} unavailable, {} of {} inference ticks published, \
         {} skipped (window not full), {} dropped (in flight), {} failed, last inference {} us",
        stats.samples_pushed,
        stats.samples_unavailable,
        stats.predictions_published,
        stats.inference_ticks,
        stats.ticks_skipped_not_full,
        stats.ticks_dropped_in_flight,
        stats.inference_failures,
        stats.last_inference_us
    );
    Ok(())
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "motion-har.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,motion_har=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
