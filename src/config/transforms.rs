//! Per-channel transform configuration
//!
//! Each `[[channels]]` entry lists its transforms in application order.
//! Position-indexed coefficients are given inline or through a JSON file in
//! the training exporter's format, resolved relative to the config file.
//!
//! ```toml
//! [[channels]]
//! channel = "acc_mag"
//!   [[channels.transforms]]
//!   kind = "power_transform"
//!   file = "acc_mag.scaler.json"
//!   [[channels.transforms]]
//!   kind = "moving_average"
//!   period = 5
//! ```

use crate::error::{HarError, Result, ResultExt};
use crate::transform::{
    MovingAverage, PowerTransform, PowerTransformCoefficients, StandardScaler,
    StandardScalerCoefficients, Transform, TransformChain,
};
use crate::types::{Channel, Sample};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preprocessing configuration for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel identifier
    pub channel: Channel,

    /// Transforms applied left to right. Empty means identity.
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

impl ChannelConfig {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            transforms: Vec::new(),
        }
    }

    /// Append a transform step
    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Build this channel's chain for windows of `capacity` samples
    pub fn build_chain(&self, capacity: usize, base_dir: Option<&Path>) -> Result<TransformChain> {
        let steps = self
            .transforms
            .iter()
            .enumerate()
            .map(|(i, t)| {
                t.build(capacity, base_dir)
                    .with_context(|| format!("channel {} transform #{}", self.channel, i))
            })
            .collect::<Result<Vec<_>>>()?;
        TransformChain::new(capacity, steps)
    }
}

/// One configured transform step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    /// Yeo-Johnson power transform, one λ per window position
    PowerTransform {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lambdas: Option<Vec<Sample>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
    },
    /// Standard scaler, one (mean, scale) pair per window position
    StandardScaler {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        means: Option<Vec<Sample>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scales: Option<Vec<Sample>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
    },
    /// Trailing moving average
    MovingAverage { period: usize },
}

impl TransformConfig {
    /// Power transform with inline coefficients
    pub fn power_inline(lambdas: Vec<Sample>) -> Self {
        TransformConfig::PowerTransform {
            lambdas: Some(lambdas),
            file: None,
        }
    }

    /// Power transform loaded from a coefficient file
    pub fn power_file(file: impl Into<PathBuf>) -> Self {
        TransformConfig::PowerTransform {
            lambdas: None,
            file: Some(file.into()),
        }
    }

    /// Standard scaler with inline coefficients
    pub fn scaler_inline(means: Vec<Sample>, scales: Vec<Sample>) -> Self {
        TransformConfig::StandardScaler {
            means: Some(means),
            scales: Some(scales),
            file: None,
        }
    }

    /// Standard scaler loaded from a coefficient file
    pub fn scaler_file(file: impl Into<PathBuf>) -> Self {
        TransformConfig::StandardScaler {
            means: None,
            scales: None,
            file: Some(file.into()),
        }
    }

    pub fn moving_average(period: usize) -> Self {
        TransformConfig::MovingAverage { period }
    }

    /// Resolve coefficients and build the transform
    pub fn build(&self, capacity: usize, base_dir: Option<&Path>) -> Result<Transform> {
        match self {
            TransformConfig::PowerTransform { lambdas, file } => {
                let lambdas = match (lambdas, file) {
                    (Some(_), Some(_)) => {
                        return Err(HarError::ConfigInvalid(
                            "power_transform takes either inline lambdas or a file, not both"
                                .to_string(),
                        ))
                    }
                    (Some(lambdas), None) => lambdas.clone(),
                    (None, Some(file)) => {
                        PowerTransformCoefficients::load(resolve(base_dir, file))?.lambdas
                    }
                    (None, None) => {
                        return Err(HarError::ConfigInvalid(
                            "power_transform needs lambdas or a file".to_string(),
                        ))
                    }
                };
                Ok(PowerTransform::new(lambdas, capacity)?.into())
            }
            TransformConfig::StandardScaler {
                means,
                scales,
                file,
            } => {
                let coefficients = match (means, scales, file) {
                    (None, None, Some(file)) => {
                        StandardScalerCoefficients::load(resolve(base_dir, file))?
                    }
                    (Some(means), Some(scales), None) => StandardScalerCoefficients {
                        means: means.clone(),
                        scales: scales.clone(),
                    },
                    _ => {
                        return Err(HarError::ConfigInvalid(
                            "standard_scaler takes inline means and scales together, or a file"
                                .to_string(),
                        ))
                    }
                };
                Ok(StandardScaler::new(coefficients.means, coefficients.scales, capacity)?.into())
            }
            TransformConfig::MovingAverage { period } => Ok(MovingAverage::new(*period)?.into()),
        }
    }
}

fn resolve(base_dir: Option<&Path>, file: &Path) -> PathBuf {
    match base_dir {
        Some(dir) if file.is_relative() => dir.join(file),
        _ => file.to_path_buf(),
    }
}
