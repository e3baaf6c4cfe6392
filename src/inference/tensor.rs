//! Timestep-major input tensor.
//!
//! Rows are time positions, columns are channels in the pipeline's fixed
//! order. Stored flat and row-major, which is the byte layout interpreters
//! expect for an input of shape `(timesteps, channels)`.

use crate::error::{HarError, Result};
use crate::types::Sample;

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<Sample>,
    timesteps: usize,
    channels: usize,
}

impl Tensor {
    /// Reshape channel-major sequences into a timestep-major tensor.
    ///
    /// Every sequence must have the same length; that length becomes the
    /// number of rows.
    pub fn from_channel_major(columns: &[Vec<Sample>]) -> Result<Self> {
        let channels = columns.len();
        let timesteps = columns.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != timesteps) {
            return Err(HarError::ConfigMismatch {
                what: "channel sequence length".to_string(),
                expected: timesteps,
                actual: bad.len(),
            });
        }

        let mut data = Vec::with_capacity(timesteps * channels);
        for t in 0..timesteps {
            for column in columns {
                data.push(column[t]);
            }
        }

        Ok(Self {
            data,
            timesteps,
            channels,
        })
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(timesteps, channels)`
    pub fn shape(&self) -> (usize, usize) {
        (self.timesteps, self.channels)
    }

    /// Flat row-major contents
    pub fn as_slice(&self) -> &[Sample] {
        &self.data
    }

    /// Values of all channels at timestep `t`
    pub fn row(&self, t: usize) -> Option<&[Sample]> {
        if t < self.timesteps {
            Some(&self.data[t * self.channels..(t + 1) * self.channels])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Sample]> {
        // chunks_exact panics on zero, and a zero-channel tensor has no rows
        self.data.chunks_exact(self.channels.max(1))
    }

    pub fn get(&self, t: usize, channel: usize) -> Option<Sample> {
        if t < self.timesteps && channel < self.channels {
            Some(self.data[t * self.channels + channel])
        } else {
            None
        }
    }

    /// Nested rows, as `Vec<Vec<_>>`
    pub fn to_rows(&self) -> Vec<Vec<Sample>> {
        self.rows().map(<[Sample]>::to_vec).collect()
    }

    /// Whether every element is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}
