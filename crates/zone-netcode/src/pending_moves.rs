//! Pending move list
//!
//! Holds predicted moves that have been simulated locally but not yet
//! acknowledged by the authority. Moves stay here after they are sent so they
//! can be replayed if the authority corrects an earlier tick.

use crate::prediction::PredictedMove;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use zone_core::Seconds;

/// An entry in the pending move list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    /// The predicted move
    pub predicted: PredictedMove,
    /// Whether this move has been handed to the transport
    pub sent: bool,
}

/// Ordered list of unacknowledged moves (oldest first)
///
/// Sent entries always precede unsent ones.
#[derive(Debug)]
pub struct PendingMoves {
    entries: VecDeque<PendingEntry>,
    capacity: usize,
    last_acknowledged: Option<Seconds>,
}

impl PendingMoves {
    /// Create an empty list holding at most `capacity` moves
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_acknowledged: None,
        }
    }

    /// Append a move
    ///
    /// Returns `Err` if the timestamp is not finite, the list is full, or the
    /// move is not newer than the newest pending one.
    pub fn push(&mut self, predicted: PredictedMove) -> crate::Result<()> {
        if !predicted.timestamp.is_finite() {
            return Err(crate::Error::InvalidTimestamp {
                timestamp: predicted.timestamp,
            });
        }
        if self.entries.len() >= self.capacity {
            return Err(crate::Error::PendingMovesFull {
                capacity: self.capacity,
            });
        }
        if let Some(newest) = self.newest_timestamp() {
            if predicted.timestamp <= newest {
                return Err(crate::Error::MoveOutOfOrder {
                    timestamp: predicted.timestamp,
                    newest,
                });
            }
        }
        self.entries.push_back(PendingEntry {
            predicted,
            sent: false,
        });
        Ok(())
    }

    /// Drop every move with a timestamp at or before `timestamp`
    ///
    /// Returns how many moves were removed. Stale and non-finite
    /// acknowledgements are ignored.
    pub fn acknowledge(&mut self, timestamp: Seconds) -> usize {
        if !timestamp.is_finite() {
            return 0;
        }
        if matches!(self.last_acknowledged, Some(last) if timestamp <= last) {
            return 0;
        }
        self.last_acknowledged = Some(timestamp);

        let mut removed = 0;
        while let Some(front) = self.entries.front() {
            if front.predicted.timestamp <= timestamp {
                self.entries.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Merge adjacent unsent moves wherever `can_merge` allows
    ///
    /// Sent moves are never touched. Returns how many moves were folded into
    /// their predecessor.
    pub fn compact_unsent<F>(&mut self, mut can_merge: F) -> usize
    where
        F: FnMut(&PredictedMove, &PredictedMove) -> bool,
    {
        let first_unsent = self.entries.iter().take_while(|e| e.sent).count();
        let unsent: Vec<PendingEntry> = self.entries.drain(first_unsent..).collect();

        let mut merged = 0;
        for entry in unsent {
            let mergeable = matches!(
                self.entries.back(),
                Some(last) if !last.sent && can_merge(&last.predicted, &entry.predicted)
            );
            if !mergeable {
                self.entries.push_back(entry);
            } else if let Some(last) = self.entries.back_mut() {
                last.predicted.absorb(&entry.predicted);
                merged += 1;
            }
        }
        merged
    }

    /// Mark every unsent move as sent, returning copies in order
    pub fn take_unsent(&mut self) -> Vec<PredictedMove> {
        let mut taken = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| !e.sent) {
            entry.sent = true;
            taken.push(entry.predicted.clone());
        }
        taken
    }

    /// Moves not yet handed to the transport
    pub fn unsent(&self) -> impl Iterator<Item = &PredictedMove> {
        self.entries.iter().filter(|e| !e.sent).map(|e| &e.predicted)
    }

    /// Moves newer than `timestamp` (for replay after a correction)
    pub fn moves_after(&self, timestamp: Seconds) -> impl Iterator<Item = &PredictedMove> {
        self.entries
            .iter()
            .map(|e| &e.predicted)
            .filter(move |m| m.timestamp > timestamp)
    }

    /// All pending moves, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    /// Timestamp of the oldest pending move
    pub fn oldest_timestamp(&self) -> Option<Seconds> {
        self.entries.front().map(|e| e.predicted.timestamp)
    }

    /// Timestamp of the newest pending move
    pub fn newest_timestamp(&self) -> Option<Seconds> {
        self.entries.back().map(|e| e.predicted.timestamp)
    }

    /// The newest acknowledged timestamp
    pub fn last_acknowledged(&self) -> Option<Seconds> {
        self.last_acknowledged
    }

    /// Get the number of pending moves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if the list is full
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Clear all moves and the acknowledgement marker
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_acknowledged = None;
    }

    /// Get the capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_move(tick: u64) -> PredictedMove {
        PredictedMove::new(tick, tick as f64, 0.016, [0.0; 3])
    }

    #[test]
    fn test_push_and_len() {
        let mut moves = PendingMoves::new(10);

        moves.push(make_move(1)).unwrap();
        moves.push(make_move(2)).unwrap();
        moves.push(make_move(3)).unwrap();

        assert_eq!(moves.len(), 3);
        assert_eq!(moves.oldest_timestamp(), Some(1.0));
        assert_eq!(moves.newest_timestamp(), Some(3.0));
    }

    #[test]
    fn test_acknowledge() {
        let mut moves = PendingMoves::new(10);

        moves.push(make_move(1)).unwrap();
        moves.push(make_move(2)).unwrap();
        moves.push(make_move(3)).unwrap();

        assert_eq!(moves.acknowledge(2.0), 2);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves.oldest_timestamp(), Some(3.0));
        assert_eq!(moves.last_acknowledged(), Some(2.0));

        // Duplicate or older acknowledgements do nothing
        assert_eq!(moves.acknowledge(2.0), 0);
        assert_eq!(moves.acknowledge(1.0), 0);
        assert_eq!(moves.last_acknowledged(), Some(2.0));
    }

    #[test]
    fn test_moves_after() {
        let mut moves = PendingMoves::new(10);

        for tick in 1..=4 {
            moves.push(make_move(tick)).unwrap();
        }

        let after_2: Vec<_> = moves.moves_after(2.0).collect();
        assert_eq!(after_2.len(), 2);
        assert_eq!(after_2[0].start_tick, 3);
        assert_eq!(after_2[1].start_tick, 4);
    }

    #[test]
    fn test_capacity() {
        let mut moves = PendingMoves::new(3);

        moves.push(make_move(1)).unwrap();
        moves.push(make_move(2)).unwrap();
        moves.push(make_move(3)).unwrap();

        assert!(moves.is_full());
        assert!(matches!(
            moves.push(make_move(4)),
            Err(crate::Error::PendingMovesFull { capacity: 3 })
        ));
    }

    #[test]
    fn test_out_of_order() {
        let mut moves = PendingMoves::new(3);
        moves.push(make_move(2)).unwrap();

        assert!(matches!(
            moves.push(make_move(2)),
            Err(crate::Error::MoveOutOfOrder { .. })
        ));
        assert!(moves.push(make_move(1)).is_err());
    }

    #[test]
    fn test_non_finite_timestamps_rejected() {
        let mut moves = PendingMoves::new(4);
        moves.push(make_move(1)).unwrap();

        let nan = PredictedMove::new(2, f64::NAN, 0.016, [0.0; 3]);
        assert!(matches!(
            moves.push(nan),
            Err(crate::Error::InvalidTimestamp { .. })
        ));
        let inf = PredictedMove::new(2, f64::INFINITY, 0.016, [0.0; 3]);
        assert!(moves.push(inf).is_err());
        assert_eq!(moves.len(), 1);

        // Ordering still holds after the rejected pushes
        assert!(moves.push(make_move(1)).is_err());
        moves.push(make_move(2)).unwrap();

        assert_eq!(moves.acknowledge(f64::NAN), 0);
        assert_eq!(moves.last_acknowledged(), None);
        assert_eq!(moves.acknowledge(1.0), 1);
        assert_eq!(moves.acknowledge(f64::NAN), 0);
        assert_eq!(moves.acknowledge(0.5), 0);
        assert_eq!(moves.last_acknowledged(), Some(1.0));
    }

    #[test]
    fn test_compact_leaves_sent_moves_alone() {
        let mut moves = PendingMoves::new(10);
        moves.push(make_move(1)).unwrap();
        moves.push(make_move(2)).unwrap();
        assert_eq!(moves.take_unsent().len(), 2);

        moves.push(make_move(3)).unwrap();
        moves.push(make_move(4)).unwrap();
        moves.push(make_move(5)).unwrap();

        let merged = moves.compact_unsent(|_, _| true);

        assert_eq!(merged, 2);
        assert_eq!(moves.len(), 3);
        let unsent: Vec<_> = moves.unsent().collect();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].start_tick, 3);
        assert_eq!(unsent[0].end_tick, 5);
    }

    #[test]
    fn test_compact_respects_predicate() {
        let mut moves = PendingMoves::new(10);
        for tick in 1..=4 {
            moves.push(make_move(tick)).unwrap();
        }

        // Only merge into moves ending on an odd tick
        let merged = moves.compact_unsent(|pending, _| pending.end_tick % 2 == 1);

        assert_eq!(merged, 2);
        let ranges: Vec<_> = moves
            .iter()
            .map(|e| (e.predicted.start_tick, e.predicted.end_tick))
            .collect();
        assert_eq!(ranges, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_clear() {
        let mut moves = PendingMoves::new(4);
        moves.push(make_move(1)).unwrap();
        moves.acknowledge(0.5);
        moves.clear();

        assert!(moves.is_empty());
        assert_eq!(moves.last_acknowledged(), None);
        assert_eq!(moves.capacity(), 4);
    }
}
