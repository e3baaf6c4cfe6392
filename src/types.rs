//! Core data types for motion-har
//!
//! This module contains the fundamental data structures shared by the
//! windowing, preprocessing and inference stages.
//!
//! # Main Types
//!
//! - [`Sample`] - One scalar reading for one channel
//! - [`Channel`] - Identifier of a logical sensor signal (a magnitude stream)
//! - [`Triaxial`] - A raw three-axis reading, reduced to a magnitude per channel
//! - [`ActivityClass`] - The SHL activity enumeration used by the default model
//! - [`Prediction`] / [`PredictionSet`] - Ranked results published by the pipeline
//! - [`PipelineStats`] - Counters describing sampling and inference activity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single scalar sample. Single precision matches the model's input tensor.
pub type Sample = f32;

/// Standard gravity in m/s², used to convert accelerometer readings given in g.
pub const STANDARD_GRAVITY: Sample = 9.81;

/// A logical sensor signal fed to the classifier
///
/// Each channel carries the euclidean magnitude of one triaxial sensor,
/// following the Android sensor conventions the training data was recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Magnitude of `TYPE_ACCELEROMETER` (gravity included), in m/s²
    AccMag,
    /// Magnitude of `TYPE_MAGNETIC_FIELD` (calibrated), in µT
    MagMag,
    /// Magnitude of `TYPE_GYROSCOPE`, in rad/s
    GyrMag,
}

impl Channel {
    /// Default channel order used by the SHL models
    pub const ORDER: [Channel; 3] = [Channel::AccMag, Channel::MagMag, Channel::GyrMag];

    /// Stable identifier, identical to the serialized form
    pub fn id(&self) -> &'static str {
        match self {
            Channel::AccMag => "acc_mag",
            Channel::MagMag => "mag_mag",
            Channel::GyrMag => "gyr_mag",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ORDER
            .iter()
            .copied()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("unknown channel '{}'", s))
    }
}

/// A raw three-axis sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Triaxial {
    pub x: Sample,
    pub y: Sample,
    pub z: Sample,
}

impl Triaxial {
    pub fn new(x: Sample, y: Sample, z: Sample) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector
    pub fn magnitude(&self) -> Sample {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Multiply every axis by `factor`
    pub fn scale(&self, factor: Sample) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn plus(&self, other: &Triaxial) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn minus(&self, other: &Triaxial) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Convert an accelerometer reading in g to m/s²
    pub fn g_to_ms2(&self) -> Self {
        self.scale(STANDARD_GRAVITY)
    }
}

/// Activity classes of the SHL dataset, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityClass {
    Null,
    Still,
    Walking,
    Run,
    Bike,
    Car,
    Bus,
    Train,
    Subway,
}

impl ActivityClass {
    /// Output order of the SHL models
    pub const ORDER: [ActivityClass; 9] = [
        ActivityClass::Null,
        ActivityClass::Still,
        ActivityClass::Walking,
        ActivityClass::Run,
        ActivityClass::Bike,
        ActivityClass::Car,
        ActivityClass::Bus,
        ActivityClass::Train,
        ActivityClass::Subway,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActivityClass::Null => "Null",
            ActivityClass::Still => "Still",
            ActivityClass::Walking => "Walking",
            ActivityClass::Run => "Run",
            ActivityClass::Bike => "Bike",
            ActivityClass::Car => "Car",
            ActivityClass::Bus => "Bus",
            ActivityClass::Train => "Train",
            ActivityClass::Subway => "Subway",
        }
    }

    /// Label names in model output order
    pub fn default_labels() -> Vec<String> {
        Self::ORDER.iter().map(|c| c.name().to_string()).collect()
    }
}

impl std::fmt::Display for ActivityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityClass::ORDER
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown activity class '{}'", s))
    }
}

/// One ranked classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Raw score from the invoker. Not required to be a probability.
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// The SHL activity this label names, if any
    pub fn activity(&self) -> Option<ActivityClass> {
        self.label.parse().ok()
    }
}

/// A complete, sorted prediction list as published by one inference tick
///
/// Replaced as a whole; readers hold an `Arc` to an immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    /// Predictions sorted by descending confidence
    pub predictions: Vec<Prediction>,
    /// Sequence number of the inference tick that produced this set
    pub tick: u64,
    /// Wall-clock time of publication
    pub published_at: DateTime<Utc>,
}

impl PredictionSet {
    pub fn new(predictions: Vec<Prediction>, tick: u64) -> Self {
        Self {
            predictions,
            tick,
            published_at: Utc::now(),
        }
    }

    /// The highest-ranked prediction
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Time elapsed since publication
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.published_at)
    }

    /// Whether this set is older than `max_age`
    pub fn is_stale(&self, max_age: std::time::Duration) -> bool {
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => self.age() > max_age,
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Statistics about sampling and inference activity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Sampling ticks executed
    pub sampling_ticks: u64,
    /// Samples pushed into windows (summed over channels)
    pub samples_pushed: u64,
    /// Per-channel reads the source could not satisfy
    pub samples_unavailable: u64,
    /// Inference ticks fired by the scheduler
    pub inference_ticks: u64,
    /// Ticks skipped because at least one window was not full
    pub ticks_skipped_not_full: u64,
    /// Ticks dropped because a previous invocation was still running
    pub ticks_dropped_in_flight: u64,
    /// Invocations that failed (or returned a malformed score vector)
    pub inference_failures: u64,
    /// Completed invocations whose result arrived after `stop()`
    pub results_discarded: u64,
    /// Prediction sets published
    pub predictions_published: u64,
    /// Wall time of the most recent completed invocation, in microseconds
    pub last_inference_us: u64,
}

impl PipelineStats {
    /// Share of completed invocations that produced a published result, in percent
    pub fn inference_success_rate(&self) -> f64 {
        let total = self.predictions_published + self.inference_failures + self.results_discarded;
        if total == 0 {
            100.0
        } else {
            ((self.predictions_published + self.results_discarded) as f64 / total as f64) * 100.0
        }
    }
}
