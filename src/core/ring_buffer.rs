//! C1: fixed-capacity FIFO of generic records.
//!
//! A single reusable type for the capped `VecDeque`-backed history fields
//! this engine needs in more than one place.

use std::collections::VecDeque;

/// A capped FIFO: `add` overwrites the oldest entry once `capacity` is
/// reached, so memory never grows past `capacity` records.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// O(1) amortized. Drops the oldest record when full.
    pub fn add(&mut self, record: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(record);
    }

    pub fn current_size(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Newest-first, optionally capped at `limit`. Chosen over oldest-first
    /// because callers (progress overviews, recent-history inspection) are
    /// almost always interested in what happened most recently.
    pub fn get_all(&self, limit: Option<usize>) -> Vec<&T> {
        let n = limit.unwrap_or(self.items.len()).min(self.items.len());
        self.items.iter().rev().take(n).collect()
    }
}
