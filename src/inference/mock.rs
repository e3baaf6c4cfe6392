//! Mock invoker for running the pipeline without a model
//!
//! Produces scripted scores, optionally sleeping to simulate model latency
//! and failing on a fixed cadence to exercise the skip path.

use crate::error::{HarError, Result};
use crate::inference::{Invoker, Tensor};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How the mock produces scores
#[derive(Debug, Clone, PartialEq)]
pub enum MockScores {
    /// The same score vector on every call
    Fixed(Vec<f32>),
    /// One-hot-ish scores whose winner advances by one class per call
    Rotating { classes: usize },
}

pub struct MockModel {
    scores: MockScores,
    latency: Duration,
    fail_every: Option<u64>,
    calls: AtomicU64,
}

impl MockModel {
    pub fn new(scores: MockScores) -> Self {
        Self {
            scores,
            latency: Duration::ZERO,
            fail_every: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn fixed(scores: Vec<f32>) -> Self {
        Self::new(MockScores::Fixed(scores))
    }

    pub fn rotating(classes: usize) -> Self {
        Self::new(MockScores::Rotating { classes })
    }

    /// Sleep for `latency` inside every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every n-th call with `InferenceFailed`
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Number of calls made so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Invoker for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    fn invoke(&self, input: &Tensor) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        if let Some(n) = self.fail_every {
            if call % n == 0 {
                return Err(HarError::InferenceFailed(format!(
                    "simulated failure on call {}",
                    call
                )));
            }
        }
        if !input.is_finite() {
            return Err(HarError::InferenceFailed(
                "input tensor contains non-finite values".to_string(),
            ));
        }

        Ok(match &self.scores {
            MockScores::Fixed(scores) => scores.clone(),
            MockScores::Rotating { classes } => {
                let classes = (*classes).max(1);
                let winner = ((call - 1) % classes as u64) as usize;
                (0..classes)
                    .map(|i| if i == winner { 0.9 } else { 0.1 / classes as f32 })
                    .collect()
            }
        })
    }
}
