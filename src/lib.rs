//! # motion-har: windowed preprocessing and inference scheduling for HAR
//!
//! Turns a stream of motion-sensor magnitudes into a continuously refreshed,
//! ranked list of activity predictions. Raw values are buffered per channel in
//! fixed-capacity ring windows; periodically, when every window is full, the
//! windows are snapshotted, passed through per-channel transform chains
//! (Yeo-Johnson power transform, standard scaling, causal moving average),
//! reshaped into a `(window, channel)` tensor and handed to an external model.
//!
//! ## Architecture
//!
//! - **Sampling**: a dedicated thread polls a [`SampleSource`] at the sampling
//!   interval and pushes into the [`RingWindow`]s
//! - **Inference**: a scheduler thread snapshots full windows at the inference
//!   interval; a worker transforms, invokes and ranks
//! - **Publication**: the latest ranked [`PredictionSet`] is swapped into a
//!   lock-protected cell that any thread can read
//!
//! ## Configuration
//!
//! The pipeline configuration is a TOML file, by default in the platform
//! config directory under `motion-har`:
//!
//! - **Linux**: `~/.config/motion-har/pipeline.toml`
//! - **macOS**: `~/Library/Application Support/motion-har/pipeline.toml`
//! - **Windows**: `%APPDATA%\motion-har\pipeline.toml`
//!
//! ## Example
//!
//! ```ignore
//! use motion_har::{
//!     config::PipelineConfig,
//!     inference::MockModel,
//!     pipeline::PipelineBuilder,
//!     sensor::MockSensorSource,
//! };
//!
//! fn main() -> motion_har::Result<()> {
//!     let config = PipelineConfig::load("pipeline.toml")?;
//!     let labels = config.labels.len();
//!
//!     let mut pipeline = PipelineBuilder::new(config)
//!         .source(MockSensorSource::walking())
//!         .invoker(MockModel::rotating(labels))
//!         .build()?;
//!     pipeline.run()?;
//!
//!     std::thread::sleep(std::time::Duration::from_secs(10));
//!     if let Some(set) = pipeline.predictions() {
//!         println!("{:?}", set.top());
//!     }
//!     pipeline.stop();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod sensor;
pub mod transform;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{HarError, Result, ResultExt};
pub use inference::{Invoker, Tensor};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineState};
pub use sensor::SampleSource;
pub use transform::{Transform, TransformChain};
pub use types::{
    ActivityClass, Channel, PipelineStats, Prediction, PredictionSet, Sample, Triaxial,
};
pub use window::RingWindow;
