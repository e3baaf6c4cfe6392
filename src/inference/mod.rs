//! Inference boundary
//!
//! The trained model and its interpreter are external. The pipeline hands an
//! [`Invoker`] a timestep-major [`Tensor`] of shape `(window_capacity,
//! channel_count)` and receives one raw score per label, in the same order on
//! every call. [`rank`] turns those scores into a sorted prediction list.
//!
//! # Components
//!
//! - [`Tensor`] - Flat row-major input buffer
//! - [`Invoker`] - Trait implemented by model adapters
//! - [`FnInvoker`] - Adapter turning a closure into an invoker
//! - [`rank`] - Stable descending sort of (label, score) pairs
//! - [`MockModel`] - Scripted scores, latency and failures (feature-gated)

#[cfg(feature = "mock-sensor")]
pub mod mock;
pub mod ranking;
pub mod tensor;

#[cfg(feature = "mock-sensor")]
pub use mock::{MockModel, MockScores};
pub use ranking::rank;
pub use tensor::Tensor;

use crate::error::Result;

/// External classification engine
///
/// Implementations may be called from a worker thread while the previous
/// call's caller has already moved on, hence `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait Invoker: Send + Sync {
    /// Human-readable name of the model or engine
    fn name(&self) -> &str;

    /// Run the model on `input`, returning one raw score per label.
    ///
    /// Errors should be reported as
    /// [`HarError::InferenceFailed`](crate::error::HarError::InferenceFailed).
    fn invoke(&self, input: &Tensor) -> Result<Vec<f32>>;
}

/// An invoker backed by a closure
pub struct FnInvoker<F> {
    name: String,
    invoke_fn: F,
}

impl<F> FnInvoker<F>
where
    F: Fn(&Tensor) -> Result<Vec<f32>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, invoke_fn: F) -> Self {
        Self {
            name: name.into(),
            invoke_fn,
        }
    }
}

impl<F> Invoker for FnInvoker<F>
where
    F: Fn(&Tensor) -> Result<Vec<f32>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, input: &Tensor) -> Result<Vec<f32>> {
        (self.invoke_fn)(input)
    }
}
