//! Error handling for the motion-har pipeline
//!
//! This module defines the error taxonomy and a Result alias used throughout
//! the crate. Construction-time variants (`ConfigMismatch`, `ConfigInvalid`,
//! `ConfigNotFound`) abort pipeline creation; runtime variants
//! (`InferenceFailed`, `SampleUnavailable`) are contained within the tick
//! that produced them.

use crate::types::Channel;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for motion-har operations
#[derive(Error, Debug)]
pub enum HarError {
    /// A coefficient vector's length does not match the window capacity
    #[error("Config mismatch in {what}: expected {expected} coefficients, got {actual}")]
    ConfigMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A degenerate numeric configuration (zero scale, zero period, ...)
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A referenced configuration resource does not exist
    #[error("Configuration resource not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The inference engine rejected or failed on a tensor
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// The sample source could not produce a reading for a channel
    #[error("Sample unavailable for channel {0}")]
    SampleUnavailable(Channel),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lifecycle operation was requested in the wrong state
    #[error("Invalid pipeline state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<HarError>,
    },
}

impl HarError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        HarError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &HarError {
        match self {
            HarError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error is fatal at pipeline construction
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self.root(),
            HarError::ConfigMismatch { .. }
                | HarError::ConfigInvalid(_)
                | HarError::ConfigNotFound(_)
                | HarError::Config(_)
                | HarError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for HarError {
    fn from(err: serde_json::Error) -> Self {
        HarError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HarError {
    fn from(err: toml::de::Error) -> Self {
        HarError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for HarError {
    fn from(err: toml::ser::Error) -> Self {
        HarError::Serialization(err.to_string())
    }
}

/// Result type alias for motion-har operations
pub type Result<T> = std::result::Result<T, HarError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
