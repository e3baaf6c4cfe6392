//! Simulated sensor source for running without hardware
//!
//! Each channel is driven by a triaxial pattern that is reduced to a
//! magnitude on read, the same way a platform adapter reduces real
//! accelerometer, magnetometer and gyroscope vectors.
//!
//! # Data Patterns
//!
//! - [`MockSensorPattern::Constant`] - Fixed vector (a device lying still)
//! - [`MockSensorPattern::Sine`] - Oscillation along one axis on top of an offset
//! - [`MockSensorPattern::Square`] - Alternating between two vectors
//! - [`MockSensorPattern::Random`] - Uniform random axes within a range
//!
//! Accelerometer patterns are expressed in g and converted to m/s².
//!
//! # Example
//!
//! ```ignore
//! use motion_har::sensor::{MockSensorSource, MockSensorPattern};
//! use motion_har::types::{Channel, Triaxial};
//!
//! let source = MockSensorSource::new().with_pattern(
//!     Channel::AccMag,
//!     MockSensorPattern::Sine {
//!         frequency: 2.0,
//!         amplitude: 0.5,
//!         offset: Triaxial::new(0.0, 0.0, 1.0),
//!     },
//! );
//! ```

use crate::error::{HarError, Result};
use crate::sensor::SampleSource;
use crate::types::{Channel, Sample, Triaxial};
use std::collections::HashMap;
use std::time::Instant;

/// Pattern for generating mock triaxial data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockSensorPattern {
    /// Constant vector
    Constant(Triaxial),
    /// Sine along the z axis added to `offset`
    Sine {
        frequency: f64,
        amplitude: Sample,
        offset: Triaxial,
    },
    /// Square wave switching between `low` and `high`
    Square {
        period: f64,
        low: Triaxial,
        high: Triaxial,
    },
    /// Uniform random axes within `[min, max)`
    Random { min: Sample, max: Sample },
}

impl MockSensorPattern {
    /// Default pattern for a channel: the device at rest
    pub fn at_rest(channel: Channel) -> Self {
        match channel {
            Channel::AccMag => MockSensorPattern::Constant(Triaxial::new(0.0, 0.0, 1.0)),
            Channel::MagMag => MockSensorPattern::Constant(Triaxial::new(20.0, 0.0, -40.0)),
            Channel::GyrMag => MockSensorPattern::Constant(Triaxial::default()),
        }
    }
}

/// Configuration for one simulated channel
#[derive(Debug, Clone)]
pub struct MockChannelConfig {
    pub pattern: MockSensorPattern,
    /// Noise amplitude added to every axis (0.0 = no noise)
    pub noise_amplitude: Sample,
    /// Every n-th read of this channel reports `SampleUnavailable`
    pub dropout_every: Option<u64>,
    reads: u64,
}

impl MockChannelConfig {
    pub fn new(pattern: MockSensorPattern) -> Self {
        Self {
            pattern,
            noise_amplitude: 0.0,
            dropout_every: None,
            reads: 0,
        }
    }

    pub fn with_noise(mut self, amplitude: Sample) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    pub fn with_dropout_every(mut self, n: u64) -> Self {
        self.dropout_every = Some(n.max(1));
        self
    }

    /// Generate a vector for the given elapsed time
    pub fn generate(&self, elapsed_secs: f64) -> Triaxial {
        let base = match self.pattern {
            MockSensorPattern::Constant(v) => v,
            MockSensorPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => {
                let phase = (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin();
                offset.plus(&Triaxial::new(0.0, 0.0, amplitude * phase as Sample))
            }
            MockSensorPattern::Square { period, low, high } => {
                if elapsed_secs % period < period / 2.0 {
                    high
                } else {
                    low
                }
            }
            MockSensorPattern::Random { min, max } => {
                let span = max - min;
                Triaxial::new(
                    min + rand_simple() * span,
                    min + rand_simple() * span,
                    min + rand_simple() * span,
                )
            }
        };

        if self.noise_amplitude > 0.0 {
            let n = self.noise_amplitude;
            base.plus(&Triaxial::new(
                (rand_simple() - 0.5) * 2.0 * n,
                (rand_simple() - 0.5) * 2.0 * n,
                (rand_simple() - 0.5) * 2.0 * n,
            ))
        } else {
            base
        }
    }
}

/// Simple pseudo-random number generator in [0, 1)
fn rand_simple() -> Sample {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = const { Cell::new(0x2545_F491_4F6C_DD1D) };
    }
    SEED.with(|seed| {
        let mut s = seed.get();
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        seed.set(s);
        ((s >> 40) as Sample) / ((1u64 << 24) as Sample)
    })
}

/// Pattern-driven sample source
pub struct MockSensorSource {
    channels: HashMap<Channel, MockChannelConfig>,
    start_time: Option<Instant>,
}

impl MockSensorSource {
    /// A source with every channel at rest
    pub fn new() -> Self {
        let channels = Channel::ORDER
            .iter()
            .map(|&c| (c, MockChannelConfig::new(MockSensorPattern::at_rest(c))))
            .collect();
        Self {
            channels,
            start_time: None,
        }
    }

    /// Replace the pattern for one channel
    pub fn with_pattern(self, channel: Channel, pattern: MockSensorPattern) -> Self {
        self.with_channel(channel, MockChannelConfig::new(pattern))
    }

    /// Replace the full configuration for one channel
    pub fn with_channel(mut self, channel: Channel, config: MockChannelConfig) -> Self {
        self.channels.insert(channel, config);
        self
    }

    /// Simulate a walking subject: periodic vertical acceleration and rotation
    pub fn walking() -> Self {
        Self::new()
            .with_channel(
                Channel::AccMag,
                MockChannelConfig::new(MockSensorPattern::Sine {
                    frequency: 1.8,
                    amplitude: 0.35,
                    offset: Triaxial::new(0.0, 0.0, 1.0),
                })
                .with_noise(0.02),
            )
            .with_channel(
                Channel::GyrMag,
                MockChannelConfig::new(MockSensorPattern::Sine {
                    frequency: 0.9,
                    amplitude: 0.8,
                    offset: Triaxial::new(0.1, 0.1, 0.0),
                })
                .with_noise(0.05),
            )
    }

    fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl Default for MockSensorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockSensorSource {
    fn name(&self) -> &str {
        "mock-sensor"
    }

    fn on_start(&mut self) -> Result<()> {
        self.start_time = Some(Instant::now());
        tracing::info!("Mock sensor source started");
        Ok(())
    }

    fn read(&mut self, channel: Channel) -> Result<Sample> {
        let elapsed = self.elapsed_secs();
        let config = self
            .channels
            .get_mut(&channel)
            .ok_or(HarError::SampleUnavailable(channel))?;

        config.reads += 1;
        if let Some(n) = config.dropout_every {
            if config.reads % n == 0 {
                return Err(HarError::SampleUnavailable(channel));
            }
        }

        let vector = config.generate(elapsed);
        let vector = match channel {
            Channel::AccMag => vector.g_to_ms2(),
            _ => vector,
        };
        Ok(vector.magnitude())
    }

    fn on_stop(&mut self) {
        tracing::info!("Mock sensor source stopped");
        self.start_time = None;
    }
}
