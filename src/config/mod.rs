//! Configuration module for motion-har
//!
//! This module handles the pipeline configuration loaded once at construction:
//! - Window capacity shared by all channels
//! - Sampling and inference intervals
//! - Channel order (tensor column order) and per-channel transform chains
//! - Label enumeration in the invoker's output order
//!
//! # File Location
//!
//! The default configuration file lives in the platform config directory:
//! - **Linux**: `~/.config/motion-har/pipeline.toml`
//! - **macOS**: `~/Library/Application Support/motion-har/pipeline.toml`
//! - **Windows**: `%APPDATA%\motion-har\pipeline.toml`
//!
//! Files ending in `.json` are read as JSON, everything else as TOML.
//!
//! # Example
//!
//! ```ignore
//! use motion_har::config::PipelineConfig;
//!
//! let config = PipelineConfig::load("models/shl/pipeline.toml")?;
//! config.validate()?;
//! let chains = config.build_chains()?;
//! ```

pub mod transforms;

pub use transforms::{ChannelConfig, TransformConfig};

use crate::error::{HarError, Result, ResultExt};
use crate::transform::TransformChain;
use crate::types::{ActivityClass, Channel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "motion-har";

/// Default config filename
pub const CONFIG_FILE: &str = "pipeline.toml";

/// Default number of samples per window (5 s at 100 Hz)
pub const DEFAULT_WINDOW_CAPACITY: usize = 500;

/// Default sampling interval in milliseconds
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 10;

/// Default inference interval in milliseconds
pub const DEFAULT_INFERENCE_INTERVAL_MS: u64 = 1000;

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Samples retained per channel
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Period of the sampling activity in milliseconds
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,

    /// Period of the inference activity in milliseconds
    #[serde(default = "default_inference_interval_ms")]
    pub inference_interval_ms: u64,

    /// Class labels, in the invoker's score order
    #[serde(default = "ActivityClass::default_labels")]
    pub labels: Vec<String>,

    /// Channels in tensor column order
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    /// Directory coefficient files are resolved against (the config file's directory)
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_sampling_interval_ms() -> u64 {
    DEFAULT_SAMPLING_INTERVAL_MS
}

fn default_inference_interval_ms() -> u64 {
    DEFAULT_INFERENCE_INTERVAL_MS
}

fn default_channels() -> Vec<ChannelConfig> {
    Channel::ORDER.iter().copied().map(ChannelConfig::new).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            inference_interval_ms: DEFAULT_INFERENCE_INTERVAL_MS,
            labels: ActivityClass::default_labels(),
            channels: default_channels(),
            base_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with identity chains for `channels`
    pub fn new(window_capacity: usize, channels: &[Channel], labels: &[&str]) -> Self {
        Self {
            window_capacity,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            channels: channels.iter().copied().map(ChannelConfig::new).collect(),
            ..Default::default()
        }
    }

    /// Set both activity intervals
    pub fn with_intervals(mut self, sampling: Duration, inference: Duration) -> Self {
        self.sampling_interval_ms = sampling.as_millis() as u64;
        self.inference_interval_ms = inference.as_millis() as u64;
        self
    }

    /// Replace a channel's transform list.
    ///
    /// Transforms for a channel that is not configured are ignored with a
    /// warning; the channel is not added.
    pub fn with_transforms(mut self, channel: Channel, transforms: Vec<TransformConfig>) -> Self {
        match self.channels.iter_mut().find(|c| c.channel == channel) {
            Some(c) => c.transforms = transforms,
            None => tracing::warn!(
                "Channel {} is not configured, ignoring {} transform(s)",
                channel,
                transforms.len()
            ),
        }
        self
    }

    /// Set the directory coefficient files are resolved against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HarError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config: PipelineConfig = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| {
                HarError::Serialization(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                HarError::Serialization(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load pipeline config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HarError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content).map_err(|e| {
            HarError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }

    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms)
    }

    /// Channels in tensor column order
    pub fn channel_order(&self) -> Vec<Channel> {
        self.channels.iter().map(|c| c.channel).collect()
    }

    /// Check structural constraints that do not need coefficient files
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(HarError::ConfigInvalid(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.sampling_interval_ms == 0 {
            return Err(HarError::ConfigInvalid(
                "sampling_interval_ms must be positive".to_string(),
            ));
        }
        if self.inference_interval_ms == 0 {
            return Err(HarError::ConfigInvalid(
                "inference_interval_ms must be positive".to_string(),
            ));
        }
        if self.channels.is_empty() {
            return Err(HarError::ConfigInvalid(
                "at least one channel is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &self.channels {
            if !seen.insert(c.channel) {
                return Err(HarError::ConfigInvalid(format!(
                    "channel {} listed more than once",
                    c.channel
                )));
            }
        }
        if self.labels.is_empty() {
            return Err(HarError::ConfigInvalid(
                "at least one label is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for label in &self.labels {
            if !seen.insert(label.as_str()) {
                return Err(HarError::ConfigInvalid(format!(
                    "label '{}' listed more than once",
                    label
                )));
            }
        }
        if self.inference_interval_ms < self.sampling_interval_ms {
            tracing::warn!(
                "inference interval ({} ms) is shorter than the sampling interval ({} ms)",
                self.inference_interval_ms,
                self.sampling_interval_ms
            );
        }
        Ok(())
    }

    /// Build one transform chain per channel, in channel order
    pub fn build_chains(&self) -> Result<Vec<TransformChain>> {
        let base_dir = self.base_dir.as_deref();
        self.channels
            .iter()
            .map(|c| {
                c.build_chain(self.window_capacity, base_dir)
                    .context("Failed to build transform chain")
            })
            .collect()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

// ==================== Tests ====================
