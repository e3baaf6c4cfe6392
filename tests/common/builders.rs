//! Test data builders for creating pipeline configurations

use motion_har::config::{PipelineConfig, TransformConfig};
use motion_har::Channel;
use std::time::Duration;

/// Builder for small, fast pipeline configurations
pub struct ConfigBuilder {
    capacity: usize,
    channels: Vec<Channel>,
    labels: Vec<String>,
    sampling: Duration,
    inference: Duration,
    transforms: Vec<(Channel, Vec<TransformConfig>)>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 3,
            channels: vec![Channel::AccMag],
            labels: vec!["Still".to_string(), "Walking".to_string()],
            sampling: Duration::from_millis(1),
            inference: Duration::from_millis(5),
            transforms: Vec::new(),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn channels(mut self, channels: &[Channel]) -> Self {
        self.channels = channels.to_vec();
        self
    }

    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn intervals(mut self, sampling: Duration, inference: Duration) -> Self {
        self.sampling = sampling;
        self.inference = inference;
        self
    }

    pub fn transforms(mut self, channel: Channel, transforms: Vec<TransformConfig>) -> Self {
        self.transforms.push((channel, transforms));
        self
    }

    pub fn build(self) -> PipelineConfig {
        let labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        let mut config = PipelineConfig::new(self.capacity, &self.channels, &labels)
            .with_intervals(self.sampling, self.inference);
        for (channel, transforms) in self.transforms {
            config = config.with_transforms(channel, transforms);
        }
        config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .capacity(7)
            .channels(&[Channel::GyrMag, Channel::AccMag])
            .labels(&["A"])
            .build();

        assert_eq!(config.window_capacity, 7);
        assert_eq!(config.channel_order(), vec![Channel::GyrMag, Channel::AccMag]);
        assert_eq!(config.labels, vec!["A".to_string()]);
        assert!(config.validate().is_ok());
    }
}
