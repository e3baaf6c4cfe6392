//! Sample source boundary
//!
//! Raw acquisition lives outside this crate. The pipeline consumes a
//! [`SampleSource`] that yields one scalar per channel on every sampling tick.
//! A source may fail for a channel on a given tick; that channel's window
//! simply does not grow for the tick.
//!
//! # Components
//!
//! - [`SampleSource`] - Trait implemented by platform adapters
//! - [`FnSource`] - Adapter turning a closure into a source
//! - [`MockSensorSource`] - Pattern-driven simulated sensors (feature-gated)

#[cfg(feature = "mock-sensor")]
pub mod mock;

#[cfg(feature = "mock-sensor")]
pub use mock::{MockChannelConfig, MockSensorPattern, MockSensorSource};

use crate::error::Result;
use crate::types::{Channel, Sample};

/// Source of per-channel samples, polled once per sampling tick
#[cfg_attr(test, mockall::automock)]
pub trait SampleSource: Send {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Called once when the pipeline starts sampling
    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read the current value for `channel`.
    ///
    /// Returns [`HarError::SampleUnavailable`](crate::error::HarError::SampleUnavailable)
    /// when no fresh reading exists for this tick.
    fn read(&mut self, channel: Channel) -> Result<Sample>;

    /// Called once after sampling has stopped
    fn on_stop(&mut self) {}
}

/// A sample source backed by a closure
pub struct FnSource<F> {
    name: String,
    read_fn: F,
}

impl<F> FnSource<F>
where
    F: FnMut(Channel) -> Result<Sample> + Send,
{
    pub fn new(name: impl Into<String>, read_fn: F) -> Self {
        Self {
            name: name.into(),
            read_fn,
        }
    }
}

impl<F> SampleSource for FnSource<F>
where
    F: FnMut(Channel) -> Result<Sample> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, channel: Channel) -> Result<Sample> {
        (self.read_fn)(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarError;

    #[test]
    fn test_fn_source_delegates_to_closure() {
        let mut calls = 0;
        let mut source = FnSource::new("counter", move |channel| {
            calls += 1;
            match channel {
                Channel::GyrMag => Err(HarError::SampleUnavailable(channel)),
                _ => Ok(calls as Sample),
            }
        });
        assert_eq!(source.name(), "counter");
        assert_eq!(source.read(Channel::AccMag).unwrap(), 1.0);
        assert!(matches!(
            source.read(Channel::GyrMag),
            Err(HarError::SampleUnavailable(Channel::GyrMag))
        ));
        assert_eq!(source.read(Channel::MagMag).unwrap(), 3.0);
        assert!(source.on_start().is_ok());
    }
}
