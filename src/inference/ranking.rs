//! Pairs raw scores with labels and orders them by confidence.

use crate::error::{HarError, Result};
use crate::types::Prediction;
use std::cmp::Ordering;

/// Pair `scores` with `labels` and sort by descending score.
///
/// The sort is stable, so equal scores keep label order. NaN scores rank
/// below every number. A score vector of the wrong length is an invoker
/// failure.
pub fn rank(labels: &[String], scores: &[f32]) -> Result<Vec<Prediction>> {
    if scores.len() != labels.len() {
        return Err(HarError::InferenceFailed(format!(
            "expected {} scores, got {}",
            labels.len(),
            scores.len()
        )));
    }

    let mut predictions: Vec<Prediction> = labels
        .iter()
        .zip(scores)
        .map(|(label, &score)| Prediction::new(label.clone(), score))
        .collect();
    predictions.sort_by(|a, b| descending(a.confidence, b.confidence));
    Ok(predictions)
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
