//! Fixed-capacity sliding window of samples for one channel.
//!
//! Pushing beyond capacity evicts the oldest samples first. Values are not
//! validated; NaN and infinities are stored and handed to the transforms as-is.

use crate::types::Sample;
use std::collections::VecDeque;

/// FIFO ring buffer holding the most recent `capacity` samples
#[derive(Debug, Clone)]
pub struct RingWindow {
    values: VecDeque<Sample>,
    capacity: usize,
}

impl RingWindow {
    /// Create an empty window. A capacity of zero is rejected by config
    /// validation before a window is ever built.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample, evicting the oldest ones while over capacity
    #[inline]
    pub fn push(&mut self, value: Sample) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Snapshot of the window contents, oldest first
    pub fn values(&self) -> Vec<Sample> {
        self.values.iter().copied().collect()
    }

    /// Copy the contents into `out`, reusing its allocation
    pub fn copy_into(&self, out: &mut Vec<Sample>) {
        out.clear();
        out.extend(self.values.iter().copied());
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<Sample> {
        self.values.back().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fills_up_to_capacity() {
        let mut window = RingWindow::new(3);
        assert!(window.is_empty());
        window.push(1.0);
        window.push(2.0);
        assert!(!window.is_full());
        window.push(3.0);
        assert!(window.is_full());
        assert_eq!(window.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = RingWindow::new(4);
        for v in 1..=5 {
            window.push(v as Sample);
        }
        assert_eq!(window.len(), 4);
        assert_eq!(window.values(), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(window.latest(), Some(5.0));
    }

    #[test]
    fn test_non_finite_values_pass_through() {
        let mut window = RingWindow::new(2);
        window.push(Sample::NAN);
        window.push(Sample::INFINITY);
        let values = window.values();
        assert!(values[0].is_nan());
        assert_eq!(values[1], Sample::INFINITY);
    }

    #[test]
    fn test_copy_into_reuses_buffer() {
        let mut window = RingWindow::new(2);
        window.push(1.0);
        window.push(2.0);
        let mut out = vec![9.0; 10];
        window.copy_into(&mut out);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_clear() {
        let mut window = RingWindow::new(2);
        window.push(1.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 2);
    }

    proptest! {
        #[test]
        fn test_window_keeps_most_recent_samples(
            capacity in 1usize..64,
            samples in prop::collection::vec(-1000.0f32..1000.0, 0..200)
        ) {
            let mut window = RingWindow::new(capacity);
            for &s in &samples {
                window.push(s);
            }

            // Property: length never exceeds capacity
            prop_assert!(window.len() <= capacity);
            prop_assert_eq!(window.is_full(), samples.len() >= capacity);

            // Property: contents are the tail of the input, in arrival order
            let start = samples.len().saturating_sub(capacity);
            prop_assert_eq!(window.values(), samples[start..].to_vec());
        }
    }
}
