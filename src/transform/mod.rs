//! Per-channel numeric preprocessing.
//!
//! A [`TransformChain`] applies an ordered list of [`Transform`]s to a full
//! window, left to right. Every step preserves length, and coefficients of the
//! position-indexed steps are checked against the window capacity when the
//! chain is built.
//!
//! # Design
//!
//! - **Closed variant set**: `Transform` is an enum; `apply` dispatches with a
//!   single match, no trait objects on the inference path.
//! - **In place**: steps rewrite one buffer; the chain allocates only the
//!   output copy of the input snapshot.

pub mod moving_average;
pub mod power;
pub mod scaler;

pub use moving_average::MovingAverage;
pub use power::{yeo_johnson, PowerTransform, PowerTransformCoefficients};
pub use scaler::{StandardScaler, StandardScalerCoefficients};

use crate::error::{HarError, Result};
use crate::types::Sample;
use serde::de::DeserializeOwned;
use std::path::Path;

/// One preprocessing step
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    PowerTransform(PowerTransform),
    StandardScaler(StandardScaler),
    MovingAverage(MovingAverage),
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::PowerTransform(_) => "power_transform",
            Transform::StandardScaler(_) => "standard_scaler",
            Transform::MovingAverage(_) => "moving_average",
        }
    }

    /// Number of per-position coefficients, if the step is position-indexed
    pub fn coefficient_len(&self) -> Option<usize> {
        match self {
            Transform::PowerTransform(t) => Some(t.len()),
            Transform::StandardScaler(t) => Some(t.len()),
            Transform::MovingAverage(_) => None,
        }
    }

    /// Apply this step to `values` in place
    #[inline]
    pub fn apply(&self, values: &mut [Sample]) {
        match self {
            Transform::PowerTransform(t) => t.apply(values),
            Transform::StandardScaler(t) => t.apply(values),
            Transform::MovingAverage(t) => t.apply(values),
        }
    }
}

impl From<PowerTransform> for Transform {
    fn from(t: PowerTransform) -> Self {
        Transform::PowerTransform(t)
    }
}

impl From<StandardScaler> for Transform {
    fn from(t: StandardScaler) -> Self {
        Transform::StandardScaler(t)
    }
}

impl From<MovingAverage> for Transform {
    fn from(t: MovingAverage) -> Self {
        Transform::MovingAverage(t)
    }
}

/// Ordered transforms for one channel's window
#[derive(Debug, Clone, PartialEq)]
pub struct TransformChain {
    steps: Vec<Transform>,
    capacity: usize,
}

impl TransformChain {
    /// Build a chain for windows of `capacity` samples
    pub fn new(capacity: usize, steps: Vec<Transform>) -> Result<Self> {
        for step in &steps {
            if let Some(len) = step.coefficient_len() {
                if len != capacity {
                    return Err(HarError::ConfigMismatch {
                        what: format!("{} coefficients", step.name()),
                        expected: capacity,
                        actual: len,
                    });
                }
            }
        }
        Ok(Self { steps, capacity })
    }

    /// A chain with no steps
    pub fn identity(capacity: usize) -> Self {
        Self {
            steps: Vec::new(),
            capacity,
        }
    }

    pub fn steps(&self) -> &[Transform] {
        &self.steps
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step over a copy of `input`
    pub fn apply(&self, input: &[Sample]) -> Result<Vec<Sample>> {
        let mut values = input.to_vec();
        self.apply_in_place(&mut values)?;
        Ok(values)
    }

    /// Run every step over `values`, which must hold exactly `capacity` samples
    pub fn apply_in_place(&self, values: &mut [Sample]) -> Result<()> {
        if values.len() != self.capacity {
            return Err(HarError::ConfigMismatch {
                what: "transform chain input".to_string(),
                expected: self.capacity,
                actual: values.len(),
            });
        }
        for step in &self.steps {
            step.apply(values);
        }
        Ok(())
    }
}

/// Read a JSON coefficient file, mapping a missing file to `ConfigNotFound`
pub(crate) fn load_coefficients<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(HarError::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        HarError::Config(format!("Failed to read coefficient file {:?}: {}", path, e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        HarError::Serialization(format!("Failed to parse coefficient file {:?}: {}", path, e))
    })
}
