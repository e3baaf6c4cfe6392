//! Pipeline executor: lifecycle, sampling tick and inference tick.
//!
//! A running pipeline uses three kinds of threads:
//! 1. `har-sampling` polls the sample source every sampling interval and
//!    pushes one value per channel into that channel's window.
//! 2. `har-inference` wakes every inference interval. When every window is
//!    full and no job is in flight it snapshots the windows and hands the
//!    snapshot to a worker.
//! 3. `har-inference-worker` transforms the snapshot, builds the tensor,
//!    invokes the model, ranks the scores and publishes them.
//!
//! The window lock is held only to push or to copy, never across transforms
//! or invocation. Publication happens under the state lock, so once `stop()`
//! returns no result can be published.

use crate::config::PipelineConfig;
use crate::error::{HarError, Result, ResultExt};
use crate::inference::{rank, Invoker, Tensor};
use crate::pipeline::published::PredictionCell;
use crate::pipeline::scheduler::{run_periodic, CancellationToken, InFlightGuard, InFlightPermit};
use crate::sensor::SampleSource;
use crate::transform::TransformChain;
use crate::types::{Channel, PipelineStats, Prediction, PredictionSet, Sample};
use crate::window::RingWindow;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a single inference tick did
#[derive(Debug)]
pub enum InferenceOutcome {
    /// A new prediction set was published
    Published { tick: u64 },
    /// At least one window was below capacity
    SkippedNotFull,
    /// A previous job was still running
    DroppedInFlight,
    /// Transform, tensor construction, invocation or ranking failed
    Failed { tick: u64, error: HarError },
    /// The job finished after `stop()` and its result was thrown away
    Discarded { tick: u64 },
    /// The pipeline was stopped before the tick could be admitted
    Cancelled,
}

impl InferenceOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, InferenceOutcome::Published { .. })
    }
}

#[derive(Debug, Default)]
struct Counters {
    sampling_ticks: AtomicU64,
    samples_pushed: AtomicU64,
    samples_unavailable: AtomicU64,
    inference_ticks: AtomicU64,
    ticks_skipped_not_full: AtomicU64,
    ticks_dropped_in_flight: AtomicU64,
    inference_failures: AtomicU64,
    results_discarded: AtomicU64,
    predictions_published: AtomicU64,
    last_inference_us: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        PipelineStats {
            sampling_ticks: load(&self.sampling_ticks),
            samples_pushed: load(&self.samples_pushed),
            samples_unavailable: load(&self.samples_unavailable),
            inference_ticks: load(&self.inference_ticks),
            ticks_skipped_not_full: load(&self.ticks_skipped_not_full),
            ticks_dropped_in_flight: load(&self.ticks_dropped_in_flight),
            inference_failures: load(&self.inference_failures),
            results_discarded: load(&self.results_discarded),
            predictions_published: load(&self.predictions_published),
            last_inference_us: load(&self.last_inference_us),
        }
    }
}

/// A snapshot admitted for inference. Holding it holds the in-flight slot.
struct InferenceJob {
    tick: u64,
    columns: Vec<Vec<Sample>>,
    permit: InFlightPermit,
}

enum Admission {
    Admitted(InferenceJob),
    Rejected(InferenceOutcome),
}

/// State shared between the owner and the activity threads
struct Shared {
    channels: Vec<Channel>,
    labels: Vec<String>,
    chains: Vec<TransformChain>,
    windows: Mutex<Vec<RingWindow>>,
    invoker: Arc<dyn Invoker>,
    predictions: PredictionCell,
    state: Mutex<PipelineState>,
    in_flight: InFlightGuard,
    next_tick: AtomicU64,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    /// Read every channel once and push the values that arrived.
    ///
    /// Reads happen before the window lock is taken so a slow source never
    /// blocks a snapshot.
    fn sample_tick(&self, source: &mut dyn SampleSource, readings: &mut Vec<Option<Sample>>) {
        Counters::bump(&self.counters.sampling_ticks);

        readings.clear();
        for &channel in &self.channels {
            match source.read(channel) {
                Ok(value) => readings.push(Some(value)),
                Err(e) => {
                    tracing::trace!("No sample for {}: {}", channel, e);
                    Counters::bump(&self.counters.samples_unavailable);
                    readings.push(None);
                }
            }
        }

        let mut windows = lock(&self.windows);
        for (window, reading) in windows.iter_mut().zip(readings.iter()) {
            if let Some(value) = reading {
                window.push(*value);
                Counters::bump(&self.counters.samples_pushed);
            }
        }
    }

    /// Decide whether this tick runs, and if so copy the windows
    ///
    /// Holds the state lock until the permit is taken, so a tick either lands
    /// before `stop()` or is cancelled outright. Lock order is state, then
    /// windows.
    fn admit(&self) -> Admission {
        let state = lock(&self.state);
        if *state == PipelineState::Stopped {
            return Admission::Rejected(InferenceOutcome::Cancelled);
        }
        Counters::bump(&self.counters.inference_ticks);

        let windows = lock(&self.windows);
        if !windows.iter().all(RingWindow::is_full) {
            Counters::bump(&self.counters.ticks_skipped_not_full);
            return Admission::Rejected(InferenceOutcome::SkippedNotFull);
        }
        let Some(permit) = self.in_flight.try_acquire() else {
            Counters::bump(&self.counters.ticks_dropped_in_flight);
            return Admission::Rejected(InferenceOutcome::DroppedInFlight);
        };
        let columns = windows.iter().map(RingWindow::values).collect();
        drop(windows);
        drop(state);

        let tick = self.next_tick.fetch_add(1, Ordering::SeqCst) + 1;
        Admission::Admitted(InferenceJob {
            tick,
            columns,
            permit,
        })
    }

    fn infer(&self, mut columns: Vec<Vec<Sample>>) -> Result<Vec<Prediction>> {
        for ((channel, chain), values) in self
            .channels
            .iter()
            .zip(&self.chains)
            .zip(columns.iter_mut())
        {
            chain
                .apply_in_place(values)
                .with_context(|| format!("Failed to transform channel {}", channel))?;
        }
        let tensor = Tensor::from_channel_major(&columns)?;
        let scores = self.invoker.invoke(&tensor)?;
        rank(&self.labels, &scores)
    }

    fn execute(&self, job: InferenceJob) -> InferenceOutcome {
        let InferenceJob {
            tick,
            columns,
            permit,
        } = job;

        let started = Instant::now();
        let result = self.infer(columns);
        self.counters
            .last_inference_us
            .store(started.elapsed().as_micros() as u64, Ordering::Relaxed);

        let outcome = match result {
            Ok(predictions) => {
                let state = lock(&self.state);
                if *state == PipelineState::Stopped {
                    Counters::bump(&self.counters.results_discarded);
                    tracing::debug!(tick, "Discarding inference result after stop");
                    InferenceOutcome::Discarded { tick }
                } else {
                    let dropped = self.predictions.publish(PredictionSet::new(predictions, tick));
                    Counters::bump(&self.counters.predictions_published);
                    if dropped > 0 {
                        tracing::trace!(tick, dropped, "Slow prediction subscribers skipped");
                    }
                    InferenceOutcome::Published { tick }
                }
            }
            Err(error) => {
                Counters::bump(&self.counters.inference_failures);
                tracing::debug!(tick, "Inference tick skipped: {}", error);
                InferenceOutcome::Failed { tick, error }
            }
        };
        drop(permit);
        outcome
    }

    /// Scheduler-thread entry point: admit, then run the job on a worker
    fn on_inference_tick(self: &Arc<Self>) {
        let job = match self.admit() {
            Admission::Admitted(job) => job,
            Admission::Rejected(outcome) => {
                tracing::trace!("Inference tick not admitted: {:?}", outcome);
                return;
            }
        };

        let tick = job.tick;
        let worker = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("har-inference-worker".to_string())
            .spawn(move || {
                let outcome = worker.execute(job);
                tracing::trace!("Inference tick finished: {:?}", outcome);
            });
        if let Err(e) = spawned {
            Counters::bump(&self.counters.inference_failures);
            tracing::warn!(tick, "Failed to spawn inference worker: {}", e);
        }
    }
}

/// Read-only view of a pipeline, cloneable across threads
#[derive(Clone)]
pub struct PipelineHandle {
    shared: Arc<Shared>,
}

impl PipelineHandle {
    /// Latest published predictions, or `None` before the first one
    pub fn predictions(&self) -> Option<Arc<PredictionSet>> {
        self.shared.predictions.latest()
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// The sensor-to-prediction pipeline
///
/// Created `Idle` by [`PipelineBuilder`]. [`run`](Self::run) starts the
/// sampling and inference activities; [`stop`](Self::stop) cancels both and
/// is terminal. While `Idle` the ticks can also be driven by hand with
/// [`sample_once`](Self::sample_once) and [`infer_once`](Self::infer_once).
pub struct Pipeline {
    shared: Arc<Shared>,
    source: Option<Box<dyn SampleSource>>,
    sampling_interval: Duration,
    inference_interval: Duration,
    token: CancellationToken,
    threads: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Latest published predictions, or `None` before the first one
    pub fn predictions(&self) -> Option<Arc<PredictionSet>> {
        self.shared.predictions.latest()
    }

    /// Receive each prediction set as it is published
    pub fn subscribe(&self) -> Receiver<Arc<PredictionSet>> {
        self.shared.predictions.subscribe()
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Channel order, which is also the tensor column order
    pub fn channels(&self) -> &[Channel] {
        &self.shared.channels
    }

    pub fn labels(&self) -> &[String] {
        &self.shared.labels
    }

    /// Current number of samples in each channel's window
    pub fn window_lengths(&self) -> Vec<usize> {
        lock(&self.shared.windows).iter().map(RingWindow::len).collect()
    }

    pub fn is_inference_in_flight(&self) -> bool {
        self.shared.in_flight.is_busy()
    }

    /// Block until no inference job is running, up to `timeout`.
    /// Returns `true` if the pipeline went idle in time.
    pub fn wait_for_inference(&self, timeout: Duration) -> bool {
        self.shared.in_flight.wait_idle(timeout)
    }

    /// Start sampling and inference.
    ///
    /// Only valid from `Idle`. Calls the source's `on_start`; if that fails
    /// the pipeline stays `Idle`.
    pub fn run(&mut self) -> Result<()> {
        let state = self.state();
        if state != PipelineState::Idle {
            return Err(HarError::InvalidState {
                operation: "run",
                state: state.to_string(),
            });
        }
        let Some(mut source) = self.source.take() else {
            return Err(HarError::InvalidState {
                operation: "run",
                state: state.to_string(),
            });
        };

        let source_name = source.name().to_string();
        if let Err(e) = source.on_start() {
            self.source = Some(source);
            return Err(e.with_context(format!("Failed to start sample source '{}'", source_name)));
        }

        *lock(&self.shared.state) = PipelineState::Running;

        let sampling = {
            let shared = Arc::clone(&self.shared);
            let token = self.token.clone();
            let interval = self.sampling_interval;
            thread::Builder::new()
                .name("har-sampling".to_string())
                .spawn(move || {
                    tracing::info!("Sampling thread started ({})", source.name());
                    let mut readings = Vec::with_capacity(shared.channels.len());
                    let ticks = run_periodic(interval, &token, || {
                        shared.sample_tick(&mut *source, &mut readings)
                    });
                    source.on_stop();
                    tracing::info!("Sampling thread exiting after {} ticks", ticks);
                })
        };
        match sampling {
            Ok(handle) => self.threads.push(handle),
            Err(e) => {
                self.stop();
                return Err(HarError::Io(e).with_context("Failed to spawn sampling thread"));
            }
        }

        let inference = {
            let shared = Arc::clone(&self.shared);
            let token = self.token.clone();
            let interval = self.inference_interval;
            thread::Builder::new()
                .name("har-inference".to_string())
                .spawn(move || {
                    tracing::info!("Inference thread started");
                    let ticks = run_periodic(interval, &token, || shared.on_inference_tick());
                    tracing::info!("Inference thread exiting after {} ticks", ticks);
                })
        };
        match inference {
            Ok(handle) => self.threads.push(handle),
            Err(e) => {
                self.stop();
                return Err(HarError::Io(e).with_context("Failed to spawn inference thread"));
            }
        }

        tracing::info!(
            "Pipeline running: {} channels, sampling every {:?}, inference every {:?}",
            self.shared.channels.len(),
            self.sampling_interval,
            self.inference_interval
        );
        Ok(())
    }

    /// Cancel both activities and wait for their threads to exit.
    ///
    /// Idempotent. An inference job still running keeps running, but its
    /// result is discarded.
    pub fn stop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            if *state == PipelineState::Stopped {
                return;
            }
            *state = PipelineState::Stopped;
        }

        self.token.cancel();
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("pipeline").to_string();
            if handle.join().is_err() {
                tracing::warn!("{} thread panicked", name);
            }
        }
        tracing::info!("Pipeline stopped");
    }

    /// Run one sampling tick on the calling thread. Only valid while `Idle`.
    pub fn sample_once(&mut self) -> Result<()> {
        let state = self.state();
        let source = match (state, self.source.as_mut()) {
            (PipelineState::Idle, Some(source)) => source,
            _ => {
                return Err(HarError::InvalidState {
                    operation: "sample_once",
                    state: state.to_string(),
                })
            }
        };
        let mut readings = Vec::with_capacity(self.shared.channels.len());
        self.shared.sample_tick(&mut **source, &mut readings);
        Ok(())
    }

    /// Run one inference tick on the calling thread and report what happened
    pub fn infer_once(&self) -> InferenceOutcome {
        match self.shared.admit() {
            Admission::Admitted(job) => self.shared.execute(job),
            Admission::Rejected(outcome) => outcome,
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("channels", &self.shared.channels)
            .field("labels", &self.shared.labels)
            .finish()
    }
}

/// Builder for [`Pipeline`]
///
/// ```ignore
/// let pipeline = PipelineBuilder::new(config)
///     .source(MockSensorSource::walking())
///     .invoker(MockModel::rotating(9))
///     .build()?;
/// ```
pub struct PipelineBuilder {
    config: PipelineConfig,
    source: Option<Box<dyn SampleSource>>,
    invoker: Option<Arc<dyn Invoker>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            source: None,
            invoker: None,
        }
    }

    pub fn source<S: SampleSource + 'static>(self, source: S) -> Self {
        self.boxed_source(Box::new(source))
    }

    pub fn boxed_source(mut self, source: Box<dyn SampleSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn invoker<I: Invoker + 'static>(self, invoker: I) -> Self {
        self.shared_invoker(Arc::new(invoker))
    }

    /// Use an invoker the caller keeps a reference to
    pub fn shared_invoker(mut self, invoker: Arc<dyn Invoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Validate the configuration, build every transform chain and create
    /// empty windows. Any configuration error here is fatal.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config;
        config.validate()?;
        let chains = config.build_chains()?;

        let source = self
            .source
            .ok_or_else(|| HarError::Config("No sample source configured".to_string()))?;
        let invoker = self
            .invoker
            .ok_or_else(|| HarError::Config("No invoker configured".to_string()))?;

        let channels = config.channel_order();
        let windows = channels
            .iter()
            .map(|_| RingWindow::new(config.window_capacity))
            .collect();

        tracing::info!(
            "Pipeline built: channels {:?}, window capacity {}, {} labels",
            channels,
            config.window_capacity,
            config.labels.len()
        );

        Ok(Pipeline {
            shared: Arc::new(Shared {
                channels,
                labels: config.labels.clone(),
                chains,
                windows: Mutex::new(windows),
                invoker,
                predictions: PredictionCell::new(),
                state: Mutex::new(PipelineState::Idle),
                in_flight: InFlightGuard::new(),
                next_tick: AtomicU64::new(0),
                counters: Counters::default(),
            }),
            source: Some(source),
            sampling_interval: config.sampling_interval(),
            inference_interval: config.inference_interval(),
            token: CancellationToken::new(),
            threads: Vec::new(),
        })
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformConfig;
    use crate::inference::{FnInvoker, MockInvoker};
    use crate::sensor::{FnSource, MockSampleSource};

    /// Source that yields 1, 2, 3, ... on every channel
    fn counting_source() -> FnSource<impl FnMut(Channel) -> Result<Sample> + Send> {
        let mut next = 0.0;
        FnSource::new("counter", move |_| {
            next += 1.0;
            Ok(next)
        })
    }

    fn config(capacity: usize, channels: &[Channel], labels: &[&str]) -> PipelineConfig {
        PipelineConfig::new(capacity, channels, labels)
            .with_intervals(Duration::from_millis(1), Duration::from_millis(5))
    }

    fn build(
        config: PipelineConfig,
        source: impl SampleSource + 'static,
        invoker: impl Invoker + 'static,
    ) -> Pipeline {
        PipelineBuilder::new(config)
            .source(source)
            .invoker(invoker)
            .build()
            .unwrap()
    }

    fn fill(pipeline: &mut Pipeline, ticks: usize) {
        for _ in 0..ticks {
            pipeline.sample_once().unwrap();
        }
    }

    #[test]
    fn test_builder_requires_source_and_invoker() {
        let config = config(3, &[Channel::AccMag], &["Still"]);
        let err = PipelineBuilder::new(config.clone())
            .invoker(MockInvoker::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, HarError::Config(_)));

        let err = PipelineBuilder::new(config)
            .source(counting_source())
            .build()
            .unwrap_err();
        assert!(matches!(err, HarError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = PipelineBuilder::new(config(0, &[Channel::AccMag], &["Still"]))
            .source(counting_source())
            .invoker(MockInvoker::new())
            .build()
            .unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_builder_rejects_coefficient_length_mismatch() {
        let config = config(3, &[Channel::AccMag], &["Still"]).with_transforms(
            Channel::AccMag,
            vec![TransformConfig::power_inline(vec![1.0, 1.0])],
        );
        let err = PipelineBuilder::new(config)
            .source(counting_source())
            .invoker(MockInvoker::new())
            .build()
            .unwrap_err();
        assert!(matches!(err.root(), HarError::ConfigMismatch { .. }));
    }

    #[test]
    fn test_new_pipeline_is_idle_and_empty() {
        let pipeline = build(
            config(3, &[Channel::AccMag, Channel::GyrMag], &["Still"]),
            counting_source(),
            MockInvoker::new(),
        );
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(pipeline.predictions().is_none());
        assert_eq!(pipeline.window_lengths(), vec![0, 0]);
        assert_eq!(pipeline.stats(), PipelineStats::default());
    }

    #[test]
    fn test_no_inference_until_windows_full() {
        let mut invoker = MockInvoker::new();
        invoker.expect_invoke().times(0);
        let mut pipeline = build(
            config(3, &[Channel::AccMag], &["Still", "Walking"]),
            counting_source(),
            invoker,
        );

        fill(&mut pipeline, 2);
        assert!(matches!(pipeline.infer_once(), InferenceOutcome::SkippedNotFull));
        assert!(pipeline.predictions().is_none());

        let stats = pipeline.stats();
        assert_eq!(stats.ticks_skipped_not_full, 1);
        assert_eq!(stats.predictions_published, 0);
    }

    #[test]
    fn test_end_to_end_single_channel() {
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|t: &Tensor| t.shape() == (3, 1) && t.as_slice() == [1.0, 2.0, 3.0])
            .times(1)
            .returning(|_| Ok(vec![0.9, 0.1]));
        let mut pipeline = build(
            config(3, &[Channel::AccMag], &["Still", "Walking"]),
            counting_source(),
            invoker,
        );

        fill(&mut pipeline, 3);
        assert!(matches!(
            pipeline.infer_once(),
            InferenceOutcome::Published { tick: 1 }
        ));

        let set = pipeline.predictions().unwrap();
        assert_eq!(set.tick, 1);
        assert_eq!(set.predictions[0], Prediction::new("Still", 0.9));
        assert_eq!(set.predictions[1], Prediction::new("Walking", 0.1));
    }

    #[test]
    fn test_predictions_sorted_by_confidence() {
        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["A", "B", "C"]),
            counting_source(),
            FnInvoker::new("fixed", |_: &Tensor| Ok(vec![0.1, 0.7, 0.2])),
        );
        fill(&mut pipeline, 2);
        assert!(pipeline.infer_once().is_published());

        let labels: Vec<_> = pipeline
            .predictions()
            .unwrap()
            .predictions
            .iter()
            .map(|p| p.label.clone())
            .collect();
        assert_eq!(labels, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_tensor_columns_follow_channel_order() {
        let source = FnSource::new("per-channel", |channel| {
            Ok(match channel {
                Channel::AccMag => 1.0,
                Channel::MagMag => 5.0,
                Channel::GyrMag => 10.0,
            })
        });
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|t: &Tensor| t.shape() == (2, 2) && t.row(0) == Some(&[10.0, 1.0][..]))
            .times(1)
            .returning(|_| Ok(vec![1.0]));
        let mut pipeline = build(
            config(2, &[Channel::GyrMag, Channel::AccMag], &["Still"]),
            source,
            invoker,
        );
        assert_eq!(pipeline.channels(), &[Channel::GyrMag, Channel::AccMag]);

        fill(&mut pipeline, 2);
        assert!(pipeline.infer_once().is_published());
    }

    #[test]
    fn test_transforms_applied_before_invocation() {
        let config = config(3, &[Channel::AccMag], &["Still"]).with_transforms(
            Channel::AccMag,
            vec![TransformConfig::scaler_inline(
                vec![1.0, 1.0, 1.0],
                vec![2.0, 2.0, 2.0],
            )],
        );
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|t: &Tensor| t.as_slice() == [0.0, 0.5, 1.0])
            .times(1)
            .returning(|_| Ok(vec![1.0]));
        let mut pipeline = build(config, counting_source(), invoker);

        fill(&mut pipeline, 3);
        assert!(pipeline.infer_once().is_published());
    }

    #[test]
    fn test_snapshot_holds_most_recent_samples() {
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|t: &Tensor| t.as_slice() == [3.0, 4.0, 5.0])
            .times(1)
            .returning(|_| Ok(vec![1.0]));
        let mut pipeline = build(
            config(3, &[Channel::AccMag], &["Still"]),
            counting_source(),
            invoker,
        );

        fill(&mut pipeline, 5);
        assert_eq!(pipeline.window_lengths(), vec![3]);
        assert!(pipeline.infer_once().is_published());
    }

    #[test]
    fn test_unavailable_sample_skips_only_that_channel() {
        let source = FnSource::new("flaky-mag", |channel| match channel {
            Channel::MagMag => Err(HarError::SampleUnavailable(channel)),
            _ => Ok(1.0),
        });
        let mut pipeline = build(
            config(3, &[Channel::AccMag, Channel::MagMag], &["Still"]),
            source,
            MockInvoker::new(),
        );

        fill(&mut pipeline, 2);
        assert_eq!(pipeline.window_lengths(), vec![2, 0]);

        let stats = pipeline.stats();
        assert_eq!(stats.sampling_ticks, 2);
        assert_eq!(stats.samples_pushed, 2);
        assert_eq!(stats.samples_unavailable, 2);
    }

    #[test]
    fn test_failed_tick_keeps_previous_predictions() {
        let calls = AtomicU64::new(0);
        let invoker = FnInvoker::new("fails-second", move |_: &Tensor| {
            if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                Err(HarError::InferenceFailed("interpreter error".to_string()))
            } else {
                Ok(vec![0.8, 0.2])
            }
        });
        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["Still", "Walking"]),
            counting_source(),
            invoker,
        );
        fill(&mut pipeline, 2);

        assert!(pipeline.infer_once().is_published());
        match pipeline.infer_once() {
            InferenceOutcome::Failed { tick, error } => {
                assert_eq!(tick, 2);
                assert!(matches!(error, HarError::InferenceFailed(_)));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let set = pipeline.predictions().unwrap();
        assert_eq!(set.tick, 1);
        assert_eq!(set.top().unwrap().label, "Still");

        assert!(pipeline.infer_once().is_published());
        assert_eq!(pipeline.predictions().unwrap().tick, 3);

        let stats = pipeline.stats();
        assert_eq!(stats.inference_failures, 1);
        assert_eq!(stats.predictions_published, 2);
    }

    #[test]
    fn test_wrong_score_count_is_a_failure() {
        let mut pipeline = build(
            config(1, &[Channel::AccMag], &["Still", "Walking"]),
            counting_source(),
            FnInvoker::new("short", |_: &Tensor| Ok(vec![1.0])),
        );
        fill(&mut pipeline, 1);
        assert!(matches!(
            pipeline.infer_once(),
            InferenceOutcome::Failed { .. }
        ));
        assert!(pipeline.predictions().is_none());
    }

    #[test]
    fn test_no_inference_after_stop() {
        let mut invoker = MockInvoker::new();
        invoker.expect_invoke().times(0);
        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["Still"]),
            counting_source(),
            invoker,
        );
        fill(&mut pipeline, 2);
        pipeline.stop();

        assert!(matches!(pipeline.infer_once(), InferenceOutcome::Cancelled));
        assert!(matches!(pipeline.infer_once(), InferenceOutcome::Cancelled));
        assert!(pipeline.predictions().is_none());
        assert!(!pipeline.is_inference_in_flight());

        let stats = pipeline.stats();
        assert_eq!(stats.inference_ticks, 0);
        assert_eq!(stats.results_discarded, 0);
    }

    #[test]
    fn test_stop_from_idle_is_terminal() {
        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["Still"]),
            counting_source(),
            MockInvoker::new(),
        );
        pipeline.stop();
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Stopped);

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, HarError::InvalidState { operation: "run", .. }));
        assert!(pipeline.sample_once().is_err());
    }

    #[test]
    fn test_source_start_failure_leaves_pipeline_idle() {
        let mut source = MockSampleSource::new();
        source.expect_name().return_const("broken".to_string());
        source
            .expect_on_start()
            .times(1)
            .returning(|| Err(HarError::Config("device missing".to_string())));
        source.expect_on_stop().times(0);

        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["Still"]),
            source,
            MockInvoker::new(),
        );
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err.root(), HarError::Config(_)));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_run_and_stop_call_source_hooks() {
        let mut source = MockSampleSource::new();
        source.expect_name().return_const("hooks".to_string());
        source.expect_on_start().times(1).returning(|| Ok(()));
        source.expect_read().returning(|_| Ok(1.0));
        source.expect_on_stop().times(1).return_const(());

        let mut pipeline = build(
            config(2, &[Channel::AccMag], &["Still"]),
            source,
            FnInvoker::new("one", |_: &Tensor| Ok(vec![1.0])),
        );
        pipeline.run().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert!(matches!(
            pipeline.run().unwrap_err(),
            HarError::InvalidState { .. }
        ));

        thread::sleep(Duration::from_millis(30));
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(pipeline.stats().sampling_ticks > 0);
    }

    #[test]
    fn test_handle_observes_pipeline() {
        let mut pipeline = build(
            config(1, &[Channel::AccMag], &["Still"]),
            counting_source(),
            FnInvoker::new("one", |_: &Tensor| Ok(vec![1.0])),
        );
        let handle = pipeline.handle();
        fill(&mut pipeline, 1);
        assert!(pipeline.infer_once().is_published());

        let observer = thread::spawn(move || handle.predictions().map(|s| s.tick));
        assert_eq!(observer.join().unwrap(), Some(1));
    }
}
