//! Predicted moves
//!
//! One [`PredictedMove`] is recorded per simulated tick while the client runs
//! ahead of the authority. It holds what the authority needs to replay the
//! tick (acceleration, delta time, movement flags) and is kept until the
//! authority acknowledges it. Before sending, adjacent moves may be merged
//! into one when doing so cannot change the simulated outcome.

use crate::flags::MoveFlags;
use serde::{Deserialize, Serialize};
use zone_core::Seconds;

/// One tick of client-simulated movement input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedMove {
    /// First simulation tick covered by this move
    pub start_tick: u64,
    /// Last simulation tick covered by this move (equal to `start_tick` until merged)
    pub end_tick: u64,
    /// Client clock at the end of the move
    pub timestamp: Seconds,
    /// Simulated seconds covered by this move
    pub delta_time: f32,
    /// Input acceleration
    pub acceleration: [f32; 3],
    /// Flags owned by the movement core; the sprint bit here is ignored
    pub base_flags: MoveFlags,
    /// Sprint intent captured for this tick
    pub wants_to_sprint: bool,
}

impl PredictedMove {
    /// Create a single-tick move with no flags set
    pub fn new(tick: u64, timestamp: Seconds, delta_time: f32, acceleration: [f32; 3]) -> Self {
        Self {
            start_tick: tick,
            end_tick: tick,
            timestamp,
            delta_time,
            acceleration,
            base_flags: MoveFlags::empty(),
            wants_to_sprint: false,
        }
    }

    /// Set the movement-core flags
    pub fn with_base_flags(mut self, flags: MoveFlags) -> Self {
        self.base_flags = flags.external();
        self
    }

    /// Set the sprint intent
    pub fn with_sprint(mut self, wants_to_sprint: bool) -> Self {
        self.wants_to_sprint = wants_to_sprint;
        self
    }

    /// Every flag the authority will see for this move
    pub fn flags(&self) -> MoveFlags {
        self.base_flags.external().with_sprint(self.wants_to_sprint)
    }

    /// The single byte sent on the wire
    pub fn compressed_flags(&self) -> u8 {
        self.flags().to_byte()
    }

    /// Whether every outcome-affecting flag matches `next`
    ///
    /// This is this crate's half of the combine decision. The movement core
    /// has its own veto through [`MovementCore::can_combine`].
    pub fn flags_match(&self, next: &PredictedMove) -> bool {
        self.compressed_flags() == next.compressed_flags()
    }

    /// Absorb the move that immediately follows this one
    ///
    /// The merged move ends where `next` ends and keeps its acceleration.
    pub fn absorb(&mut self, next: &PredictedMove) {
        self.end_tick = next.end_tick;
        self.timestamp = next.timestamp;
        self.delta_time += next.delta_time;
        self.acceleration = next.acceleration;
    }

    /// Number of simulation ticks covered
    pub fn tick_count(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick) + 1
    }

    /// The form sent to the authority
    pub fn to_wire(&self) -> WireMove {
        WireMove {
            timestamp: self.timestamp,
            delta_time: self.delta_time,
            acceleration: self.acceleration,
            flags: self.compressed_flags(),
        }
    }
}

/// A predicted move as transmitted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireMove {
    /// Client clock at the end of the move
    pub timestamp: Seconds,
    /// Simulated seconds covered
    pub delta_time: f32,
    /// Input acceleration
    pub acceleration: [f32; 3],
    /// Compressed flags byte
    pub flags: u8,
}

impl WireMove {
    /// The decoded flags
    pub fn move_flags(&self) -> MoveFlags {
        MoveFlags::from_byte(self.flags)
    }
}

/// The movement simulation's say in whether two moves can merge
///
/// Implemented by whatever owns the physical simulation. It sees both moves
/// after the flag comparison has already passed.
pub trait MovementCore {
    /// Whether merging `next` into `pending` keeps the simulated outcome
    fn can_combine(&self, pending: &PredictedMove, next: &PredictedMove) -> bool;
}

/// Combines moves whose accelerations agree within a tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMovementCore {
    /// Largest per-axis acceleration difference still considered equal
    pub acceleration_tolerance: f32,
}

impl Default for StandardMovementCore {
    fn default() -> Self {
        Self {
            acceleration_tolerance: 1e-3,
        }
    }
}

impl MovementCore for StandardMovementCore {
    fn can_combine(&self, pending: &PredictedMove, next: &PredictedMove) -> bool {
        pending
            .acceleration
            .iter()
            .zip(next.acceleration.iter())
            .all(|(a, b)| (a - b).abs() <= self.acceleration_tolerance)
    }
}
