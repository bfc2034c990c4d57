//! Predicted move reconciliation
//!
//! Client side, [`MoveReconciler`] captures the sprint intent into a
//! [`PredictedMove`] every tick, keeps the move until the authority
//! acknowledges it, compacts the unsent tail before transmission, and replays
//! the remaining moves after a correction.
//!
//! Authority side, [`ServerMoveGate`] accepts moves in timestamp order and
//! applies the decoded intent to the authoritative simulation right away, so
//! the server steps the same input the client predicted with.

use crate::config::MoveConfig;
use crate::flags::{self, MoveFlags};
use crate::movement::MovementAuthority;
use crate::pending_moves::PendingMoves;
use crate::prediction::{MovementCore, PredictedMove, WireMove};
use crate::Result;
use tracing::{debug, trace};
use zone_core::Seconds;

/// Counters describing reconciler activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Moves recorded into the pending list
    pub recorded: u64,
    /// Moves folded into their predecessor during compaction
    pub combined: u64,
    /// Moves handed to the transport
    pub sent: u64,
    /// Moves dropped after acknowledgement
    pub acknowledged: u64,
    /// Moves re-simulated after a correction
    pub replayed: u64,
}

/// Client-side predicted move bookkeeping
#[derive(Debug)]
pub struct MoveReconciler {
    pending: PendingMoves,
    max_combine_delta: f32,
    stats: ReconcileStats,
}

impl MoveReconciler {
    /// Create a reconciler; the config is sanitized first
    pub fn new(config: MoveConfig) -> Self {
        let config = config.sanitized();
        Self {
            pending: PendingMoves::new(config.pending_capacity),
            max_combine_delta: config.max_combine_delta,
            stats: ReconcileStats::default(),
        }
    }

    /// Build this tick's move, capturing the current sprint intent
    pub fn capture<S: MovementAuthority + ?Sized>(
        tick: u64,
        timestamp: Seconds,
        delta_time: f32,
        acceleration: [f32; 3],
        base_flags: MoveFlags,
        state: &S,
    ) -> PredictedMove {
        PredictedMove::new(tick, timestamp, delta_time, acceleration)
            .with_base_flags(base_flags)
            .with_sprint(state.wants_to_sprint())
    }

    /// Add a move to the pending list
    pub fn record(&mut self, predicted: PredictedMove) -> Result<()> {
        self.pending.push(predicted)?;
        self.stats.recorded += 1;
        Ok(())
    }

    /// Whether `next` can be merged into `pending` without losing information
    ///
    /// Requires bit-identical flags, a combined delta time within the
    /// configured limit, and the movement core's agreement.
    pub fn can_combine<C: MovementCore + ?Sized>(
        &self,
        pending: &PredictedMove,
        next: &PredictedMove,
        core: &C,
    ) -> bool {
        combinable(pending, next, self.max_combine_delta, core)
    }

    /// Compact the unsent moves and return them ready for the wire
    ///
    /// Sent moves stay pending until acknowledged.
    pub fn prepare_send<C: MovementCore + ?Sized>(&mut self, core: &C) -> Vec<WireMove> {
        let max_delta = self.max_combine_delta;
        let combined = self
            .pending
            .compact_unsent(|pending, next| combinable(pending, next, max_delta, core));

        let wire: Vec<WireMove> = self
            .pending
            .take_unsent()
            .iter()
            .map(PredictedMove::to_wire)
            .collect();

        self.stats.combined += combined as u64;
        self.stats.sent += wire.len() as u64;
        if !wire.is_empty() {
            debug!(
                moves = wire.len(),
                combined,
                pending = self.pending.len(),
                "prepared predicted moves"
            );
        }
        wire
    }

    /// Drop every move the authority has processed
    pub fn acknowledge(&mut self, timestamp: Seconds) -> usize {
        let removed = self.pending.acknowledge(timestamp);
        self.stats.acknowledged += removed as u64;
        trace!(timestamp, removed, "moves acknowledged");
        removed
    }

    /// Restore a move's intent on the movement state before re-simulating it
    pub fn prep_for_replay<S>(predicted: &PredictedMove, state: &mut S)
    where
        S: MovementAuthority + ?Sized,
    {
        state.set_wants_to_sprint(predicted.wants_to_sprint);
    }

    /// Apply an authority correction and replay the moves after it
    ///
    /// Moves up to `timestamp` are acknowledged. Each later move has its
    /// intent restored on `state` and is then passed to `simulate`. Returns the
    /// number of replayed moves.
    ///
    /// `timestamp` must be the end of a sent move, as reported by
    /// [`ServerMoveGate::ack_timestamp`]. A merged move straddling it would be
    /// replayed whole.
    pub fn replay_after<S, F>(
        &mut self,
        timestamp: Seconds,
        state: &mut S,
        mut simulate: F,
    ) -> usize
    where
        S: MovementAuthority + ?Sized,
        F: FnMut(&PredictedMove, &mut S),
    {
        self.acknowledge(timestamp);

        let mut replayed = 0;
        for predicted in self.pending.moves_after(timestamp) {
            Self::prep_for_replay(predicted, state);
            simulate(predicted, state);
            replayed += 1;
        }

        self.stats.replayed += replayed as u64;
        debug!(timestamp, replayed, "replayed moves after correction");
        replayed
    }

    /// Decode a received flags byte into the movement state
    ///
    /// On the authority the decoded intent is applied to the simulation
    /// immediately. Returns the decoded intent.
    pub fn apply_compressed_flags<S: MovementAuthority + ?Sized>(flags: u8, state: &mut S) -> bool {
        let wants_to_sprint = flags::decode_sprint(flags);
        state.set_wants_to_sprint(wants_to_sprint);

        if state.has_authority() {
            if wants_to_sprint {
                state.sprint();
            } else {
                state.unsprint();
            }
        }
        wants_to_sprint
    }

    /// The pending move list
    pub fn pending(&self) -> &PendingMoves {
        &self.pending
    }

    /// Activity counters
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Longest combined delta time
    pub fn max_combine_delta(&self) -> f32 {
        self.max_combine_delta
    }

    /// Drop every pending move (after a teleport or a reconnect)
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

impl Default for MoveReconciler {
    fn default() -> Self {
        Self::new(MoveConfig::default())
    }
}

fn combinable<C: MovementCore + ?Sized>(
    pending: &PredictedMove,
    next: &PredictedMove,
    max_delta: f32,
    core: &C,
) -> bool {
    pending.flags_match(next)
        && pending.delta_time + next.delta_time <= max_delta
        && core.can_combine(pending, next)
}

/// Authority-side intake of client moves
#[derive(Debug, Default)]
pub struct ServerMoveGate {
    last_timestamp: Option<Seconds>,
    accepted: u64,
    rejected: u64,
}

impl ServerMoveGate {
    /// Create a gate that has seen no moves
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one received move
    ///
    /// Moves not newer than the last accepted one are duplicates or arrived
    /// out of order, and moves with a non-finite timestamp are malformed; both
    /// are dropped and `false` is returned.
    pub fn receive<S>(&mut self, received: &WireMove, state: &mut S) -> bool
    where
        S: MovementAuthority + ?Sized,
    {
        if !received.timestamp.is_finite() {
            self.rejected += 1;
            trace!(timestamp = received.timestamp, "dropping malformed move");
            return false;
        }
        if matches!(self.last_timestamp, Some(last) if received.timestamp <= last) {
            self.rejected += 1;
            trace!(timestamp = received.timestamp, "dropping stale move");
            return false;
        }

        MoveReconciler::apply_compressed_flags(received.flags, state);
        self.last_timestamp = Some(received.timestamp);
        self.accepted += 1;
        true
    }

    /// Timestamp to acknowledge back to the client
    pub fn ack_timestamp(&self) -> Option<Seconds> {
        self.last_timestamp
    }

    /// Moves applied so far
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Moves dropped as stale
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
