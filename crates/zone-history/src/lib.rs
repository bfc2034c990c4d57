//! Zone History - Fixed-capacity sample history for network estimators
//!
//! This crate provides a bounded, memory-efficient numeric history used to
//! smooth noisy measurements such as round-trip times and clock offsets.
//!
//! # Features
//!
//! - **Bounded memory**: Capacity is clamped to `2..=255`, no unbounded growth
//! - **Two insertion policies**: `insert` keeps the newest samples and evicts
//!   the oldest, `append` fills up once and then ignores further samples
//! - **Aggregates**: `min`, `max` and `average`, all defined as 0 when empty
//!
//! # Example
//!
//! ```rust
//! use zone_history::SampleHistory;
//!
//! // Keep the three most recent round trips
//! let mut history = SampleHistory::new(3);
//!
//! history.insert(0.12);
//! history.insert(0.10);
//! history.insert(0.14);
//! history.insert(0.08); // evicts 0.12
//!
//! assert_eq!(history.values().collect::<Vec<_>>(), vec![0.08, 0.14, 0.10]);
//! assert!((history.average() - 0.106666).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Smallest capacity a history can be configured with
pub const MIN_CAPACITY: usize = 2;

/// Largest capacity a history can be configured with
pub const MAX_CAPACITY: usize = 255;

/// Default capacity, matching the smallest useful window
pub const DEFAULT_CAPACITY: usize = MIN_CAPACITY;

/// A bounded history of numeric samples
///
/// Samples added with [`insert`](Self::insert) are stored newest-first and the
/// oldest sample falls off the end once the history is full. Samples added
/// with [`append`](Self::append) are stored in arrival order and are dropped
/// once the history is full. The two policies are meant to be used one at a
/// time on a given history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct SampleHistory {
    /// Stored samples; the front is the newest for `insert`
    values: VecDeque<f64>,
    /// Maximum number of samples kept
    capacity: usize,
}

/// Serialized form, checked before it becomes a [`SampleHistory`]
#[derive(Deserialize)]
struct StoredHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl From<StoredHistory> for SampleHistory {
    fn from(stored: StoredHistory) -> Self {
        let capacity = clamp_capacity(stored.capacity);
        let mut values = stored.values;
        values.truncate(capacity);
        Self { values, capacity }
    }
}

impl SampleHistory {
    /// Create an empty history
    ///
    /// `capacity` is clamped into `[MIN_CAPACITY, MAX_CAPACITY]`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use zone_history::SampleHistory;
    ///
    /// assert_eq!(SampleHistory::new(0).capacity(), 2);
    /// assert_eq!(SampleHistory::new(1000).capacity(), 255);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let capacity = clamp_capacity(capacity);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Re-initialize with a new capacity, discarding every sample
    pub fn init(&mut self, capacity: usize) {
        self.values.clear();
        self.capacity = clamp_capacity(capacity);
    }

    /// Add a sample as the newest entry
    ///
    /// When this pushes the history over capacity, the oldest samples are
    /// dropped so exactly `capacity` of the most recent remain.
    pub fn insert(&mut self, value: f64) {
        self.values.push_front(value);
        self.values.truncate(self.capacity);
    }

    /// Add a sample at the end, unless the history is already full
    ///
    /// Returns whether the sample was stored.
    pub fn append(&mut self, value: f64) -> bool {
        if self.values.len() >= self.capacity {
            return false;
        }
        self.values.push_back(value);
        true
    }

    /// Remove every sample; the capacity is unchanged
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Arithmetic mean of the stored samples, or 0 when empty
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Smallest stored sample, or 0 when empty
    pub fn min(&self) -> f64 {
        self.values.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    /// Largest stored sample, or 0 when empty
    pub fn max(&self) -> f64 {
        self.values.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// The front sample (newest, when filled with `insert`)
    pub fn latest(&self) -> Option<f64> {
        self.values.front().copied()
    }

    /// Iterate over the stored samples in storage order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Maximum number of samples kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no samples are stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if the history holds `capacity` samples
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Get statistics about the history
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            capacity: self.capacity,
            count: self.values.len(),
            min: self.min(),
            max: self.max(),
            average: self.average(),
        }
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(MIN_CAPACITY, MAX_CAPACITY)
}

/// Statistics about a sample history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored samples
    pub count: usize,
    /// Smallest sample (0 when empty)
    pub min: f64,
    /// Largest sample (0 when empty)
    pub max: f64,
    /// Mean of the samples (0 when empty)
    pub average: f64,
}

impl HistoryStats {
    /// Spread between the largest and smallest sample
    pub fn spread(&self) -> f64 {
        self.max - self.min
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let history = SampleHistory::new(10);
        assert_eq!(history.capacity(), 10);
        assert_eq!(history.len(), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_capacity_clamped() {
        assert_eq!(SampleHistory::new(0).capacity(), 2);
        assert_eq!(SampleHistory::new(1).capacity(), 2);
        assert_eq!(SampleHistory::new(255).capacity(), 255);
        assert_eq!(SampleHistory::new(256).capacity(), 255);
        assert_eq!(SampleHistory::default().capacity(), 2);
    }

    #[test]
    fn test_insert_keeps_newest_first() {
        let mut history = SampleHistory::new(3);

        history.insert(1.0);
        history.insert(2.0);
        history.insert(3.0);
        assert!(history.is_full());

        // Over capacity - oldest falls off
        history.insert(4.0);
        history.insert(5.0);

        assert_eq!(history.len(), 3);
        assert_eq!(history.values().collect::<Vec<_>>(), vec![5.0, 4.0, 3.0]);
        assert_eq!(history.latest(), Some(5.0));
    }

    #[test]
    fn test_append_stops_when_full() {
        let mut history = SampleHistory::new(2);

        assert!(history.append(1.0));
        assert!(history.append(2.0));
        assert!(!history.append(3.0));
        assert!(!history.append(4.0));

        assert_eq!(history.values().collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_aggregates_empty() {
        let history = SampleHistory::new(4);
        assert_eq!(history.average(), 0.0);
        assert_eq!(history.min(), 0.0);
        assert_eq!(history.max(), 0.0);
        assert_eq!(history.latest(), None);
    }

    #[test]
    fn test_aggregates() {
        let mut history = SampleHistory::new(4);
        history.insert(1.0);
        history.insert(2.0);
        history.insert(3.0);

        assert_eq!(history.average(), 2.0);
        assert_eq!(history.min(), 1.0);
        assert_eq!(history.max(), 3.0);
    }

    #[test]
    fn test_aggregates_negative() {
        let mut history = SampleHistory::new(4);
        history.insert(-0.5);
        history.insert(-1.5);

        assert_eq!(history.min(), -1.5);
        assert_eq!(history.max(), -0.5);
        assert_eq!(history.average(), -1.0);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut history = SampleHistory::new(5);
        history.insert(1.0);
        history.insert(2.0);

        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.capacity(), 5);
        assert_eq!(history.average(), 0.0);
    }

    #[test]
    fn test_init_resets() {
        let mut history = SampleHistory::new(5);
        history.insert(1.0);

        history.init(300);

        assert!(history.is_empty());
        assert_eq!(history.capacity(), 255);
    }

    #[test]
    fn test_stats() {
        let mut history = SampleHistory::new(4);
        history.insert(0.1);
        history.insert(0.3);

        let stats = history.stats();
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.3);
        assert!((stats.average - 0.2).abs() < 1e-12);
        assert!((stats.spread() - 0.2).abs() < 1e-12);
        assert_eq!(stats.fill_ratio(), 0.5);
    }

    #[test]
    fn test_deserialize_clamps_capacity() {
        let history: SampleHistory =
            ron::from_str("(values: [1.0, 2.0, 3.0, 4.0], capacity: 0)").unwrap();

        assert_eq!(history.capacity(), MIN_CAPACITY);
        assert_eq!(history.len(), 2);
        assert_eq!(history.values().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(history.stats().fill_ratio(), 1.0);

        let history: SampleHistory = ron::from_str("(values: [], capacity: 1000)").unwrap();
        assert_eq!(history.capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_serialized_history_reloads() {
        let mut history = SampleHistory::new(3);
        history.insert(0.2);
        history.insert(0.4);

        let text = ron::to_string(&history).unwrap();
        let reloaded: SampleHistory = ron::from_str(&text).unwrap();
        assert_eq!(reloaded, history);
    }
}
