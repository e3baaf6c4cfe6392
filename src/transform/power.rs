//! Yeo-Johnson power transform with one λ per window position.
//!
//! Matches scikit-learn's `PowerTransformer(method="yeo-johnson")` applied to
//! a window flattened into features, so λ is indexed by the sample's position
//! in the window, not by channel.

use crate::error::{HarError, Result};
use crate::types::Sample;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coefficient file format written by the training tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformCoefficients {
    pub lambdas: Vec<Sample>,
}

impl PowerTransformCoefficients {
    /// Load coefficients from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        super::load_coefficients(path.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerTransform {
    lambdas: Vec<Sample>,
}

impl PowerTransform {
    /// Build a transform for windows of `capacity` samples
    pub fn new(lambdas: Vec<Sample>, capacity: usize) -> Result<Self> {
        if lambdas.len() != capacity {
            return Err(HarError::ConfigMismatch {
                what: "power transform lambdas".to_string(),
                expected: capacity,
                actual: lambdas.len(),
            });
        }
        if let Some(i) = lambdas.iter().position(|l| !l.is_finite()) {
            return Err(HarError::ConfigInvalid(format!(
                "power transform lambda at position {} is not finite",
                i
            )));
        }
        Ok(Self { lambdas })
    }

    pub fn lambdas(&self) -> &[Sample] {
        &self.lambdas
    }

    pub fn len(&self) -> usize {
        self.lambdas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lambdas.is_empty()
    }

    pub fn apply(&self, values: &mut [Sample]) {
        for (x, &lambda) in values.iter_mut().zip(&self.lambdas) {
            *x = yeo_johnson(*x, lambda);
        }
    }
}

/// Yeo-Johnson transform of a single value
#[inline]
pub fn yeo_johnson(x: Sample, lambda: Sample) -> Sample {
    if x >= 0.0 {
        if lambda != 0.0 {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        } else {
            (x + 1.0).ln()
        }
    } else if lambda != 2.0 {
        -((-x + 1.0).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    } else {
        -(-x + 1.0).ln()
    }
}
