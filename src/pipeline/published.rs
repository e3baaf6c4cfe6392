//! Latest-value cell for published predictions.
//!
//! One writer (the inference activity) replaces the whole set by swapping an
//! `Arc`; any number of readers clone the current `Arc`. The lock is held only
//! for the pointer swap or clone, never while ranking or rendering.

use crate::types::PredictionSet;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, RwLock};

/// Capacity of each subscriber's queue
pub const SUBSCRIBER_QUEUE_LEN: usize = 16;

#[derive(Default)]
pub struct PredictionCell {
    current: RwLock<Option<Arc<PredictionSet>>>,
    subscribers: Mutex<Vec<Sender<Arc<PredictionSet>>>>,
}

impl PredictionCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent set, or `None` before the first successful tick
    pub fn latest(&self) -> Option<Arc<PredictionSet>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the current set and notify subscribers.
    ///
    /// Returns the number of notifications dropped because a subscriber's
    /// queue was full.
    pub fn publish(&self, set: PredictionSet) -> u64 {
        let set = Arc::new(set);
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = Some(Arc::clone(&set));
        }

        let mut dropped = 0;
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| match tx.try_send(Arc::clone(&set)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        dropped
    }

    /// Receive every future publication. Slow receivers miss updates rather
    /// than delaying the publisher.
    pub fn subscribe(&self) -> Receiver<Arc<PredictionSet>> {
        let (tx, rx) = bounded(SUBSCRIBER_QUEUE_LEN);
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }
}

impl std::fmt::Debug for PredictionCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionCell")
            .field("current", &self.latest().map(|s| s.tick))
            .finish()
    }
}
