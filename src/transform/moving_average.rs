//! Trailing (causal) moving average.
//!
//! Output position `i` is the mean of inputs `[max(0, i-p+1), i]`; the window
//! shrinks at the start instead of padding.

use crate::error::{HarError, Result};
use crate::types::Sample;

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    period: usize,
}

impl MovingAverage {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(HarError::ConfigInvalid(
                "moving average period must be at least 1".to_string(),
            ));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Smooth `values` in place
    pub fn apply(&self, values: &mut [Sample]) {
        if self.period == 1 {
            return;
        }

        // Inputs leaving the trailing window are overwritten by the time we
        // need them, so keep the last `period` originals in a small ring.
        // Each mean is recomputed from the ring, never carried between outputs
        let mut history = vec![0.0 as Sample; self.period];
        for i in 0..values.len() {
            history[i % self.period] = values[i];
            let count = (i + 1).min(self.period);
            let sum: f64 = history[..count].iter().map(|&v| v as f64).sum();
            values[i] = (sum / count as f64) as Sample;
        }
    }
}
