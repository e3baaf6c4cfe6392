//! Standard scaler with one (mean, scale) pair per window position.

use crate::error::{HarError, Result};
use crate::types::Sample;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coefficient file format written by the training tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerCoefficients {
    pub means: Vec<Sample>,
    pub scales: Vec<Sample>,
}

impl StandardScalerCoefficients {
    /// Load coefficients from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        super::load_coefficients(path.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<Sample>,
    scales: Vec<Sample>,
}

impl StandardScaler {
    pub fn new(means: Vec<Sample>, scales: Vec<Sample>, capacity: usize) -> Result<Self> {
        if means.len() != capacity {
            return Err(HarError::ConfigMismatch {
                what: "standard scaler means".to_string(),
                expected: capacity,
                actual: means.len(),
            });
        }
        if scales.len() != capacity {
            return Err(HarError::ConfigMismatch {
                what: "standard scaler scales".to_string(),
                expected: capacity,
                actual: scales.len(),
            });
        }
        if let Some(i) = scales.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(HarError::ConfigInvalid(format!(
                "standard scaler scale at position {} is {}",
                i, scales[i]
            )));
        }
        if let Some(i) = means.iter().position(|m| !m.is_finite()) {
            return Err(HarError::ConfigInvalid(format!(
                "standard scaler mean at position {} is not finite",
                i
            )));
        }
        Ok(Self { means, scales })
    }

    /// A scaler that leaves every position unchanged
    pub fn identity(capacity: usize) -> Self {
        Self {
            means: vec![0.0; capacity],
            scales: vec![1.0; capacity],
        }
    }

    pub fn means(&self) -> &[Sample] {
        &self.means
    }

    pub fn scales(&self) -> &[Sample] {
        &self.scales
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn apply(&self, values: &mut [Sample]) {
        for ((x, &mean), &scale) in values.iter_mut().zip(&self.means).zip(&self.scales) {
            *x = (*x - mean) / scale;
        }
    }
}
