//! Sensor-to-prediction pipeline.
//!
//! Samples flow from a [`SampleSource`](crate::sensor::SampleSource) into one
//! ring window per channel. On every inference tick the full windows are
//! snapshotted, transformed, reshaped into a tensor, scored by an
//! [`Invoker`](crate::inference::Invoker) and published as a ranked
//! [`PredictionSet`](crate::types::PredictionSet).
//!
//! # Architecture
//!
//! ```text
//! [SampleSource] ──► [RingWindow x C] ──snapshot──► [TransformChain x C]
//!                                                         │
//!                     [PredictionCell] ◄── rank ◄── [Invoker] ◄── Tensor(W x C)
//! ```
//!
//! # Design
//!
//! - **Two periodic activities**: sampling and inference each run on their
//!   own thread, driven by `crossbeam_channel::tick`.
//! - **Short critical sections**: the window lock covers a push or a copy.
//! - **At most one job in flight**: an inference tick that finds a job
//!   running is dropped, never queued.
//! - **Latest-value publication**: readers get an `Arc` to a complete set.

pub mod executor;
pub mod published;
pub mod scheduler;

pub use executor::{InferenceOutcome, Pipeline, PipelineBuilder, PipelineHandle, PipelineState};
pub use published::PredictionCell;
pub use scheduler::{run_periodic, CancellationToken, InFlightGuard, InFlightPermit};
