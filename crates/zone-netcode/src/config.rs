//! Netcode configuration - clock sync thresholds, move buffering, sprint tuning
//!
//! Every section implements `Default` with the values the game shipped with,
//! and every field is optional in RON, so a config file only needs to name
//! what it overrides:
//!
//! ```
//! use zone_netcode::NetcodeConfig;
//!
//! let config = NetcodeConfig::from_ron_str("(clock_sync: (round_trip_threshold: 0.25))").unwrap();
//! assert_eq!(config.clock_sync.round_trip_threshold, 0.25);
//! assert_eq!(config.clock_sync.probe_period, 5.0);
//! ```

use crate::movement::SprintSettings;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zone_core::Seconds;
use zone_history::{MAX_CAPACITY, MIN_CAPACITY};

/// Clock synchronization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSyncConfig {
    /// Seconds between time-sync probes
    pub probe_period: Seconds,
    /// Longest round trip (seconds) whose sample is still trusted
    pub round_trip_threshold: Seconds,
    /// Number of accepted round trips averaged
    pub round_trip_history: usize,
    /// Number of accepted clock offsets averaged
    pub offset_history: usize,
    /// Consecutive rejected samples before the connection monitor is told
    pub failures_to_disconnect: u32,
}

impl ClockSyncConfig {
    /// Replace out-of-range values
    ///
    /// Non-positive or non-finite durations fall back to their defaults,
    /// history sizes are clamped to `[2, 255]` and the failure threshold is at
    /// least 1.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.probe_period.is_finite() && self.probe_period > 0.0) {
            self.probe_period = defaults.probe_period;
        }
        if !(self.round_trip_threshold.is_finite() && self.round_trip_threshold > 0.0) {
            self.round_trip_threshold = defaults.round_trip_threshold;
        }
        self.round_trip_history = self.round_trip_history.clamp(MIN_CAPACITY, MAX_CAPACITY);
        self.offset_history = self.offset_history.clamp(MIN_CAPACITY, MAX_CAPACITY);
        self.failures_to_disconnect = self.failures_to_disconnect.max(1);
        self
    }
}

impl Default for ClockSyncConfig {
    fn default() -> Self {
        Self {
            probe_period: 5.0,
            round_trip_threshold: 0.4,
            round_trip_history: 2,
            offset_history: 10,
            failures_to_disconnect: 5,
        }
    }
}

/// Predicted move buffering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    /// Maximum moves awaiting server acknowledgement
    pub pending_capacity: usize,
    /// Longest combined delta time (seconds) two moves may merge into
    pub max_combine_delta: f32,
}

impl MoveConfig {
    /// Replace out-of-range values
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.pending_capacity = self.pending_capacity.max(1);
        if !(self.max_combine_delta.is_finite() && self.max_combine_delta >= 0.0) {
            self.max_combine_delta = defaults.max_combine_delta;
        }
        self
    }
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            pending_capacity: 96,
            max_combine_delta: 0.125,
        }
    }
}

/// Top-level netcode configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetcodeConfig {
    /// Clock synchronization
    pub clock_sync: ClockSyncConfig,
    /// Predicted move buffering
    pub moves: MoveConfig,
    /// Sprint movement tuning
    pub sprint: SprintSettings,
}

impl NetcodeConfig {
    /// Parse a RON document; the result is sanitized
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: NetcodeConfig = ron::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Load a RON file; the result is sanitized
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Sanitize every section
    pub fn sanitized(self) -> Self {
        Self {
            clock_sync: self.clock_sync.sanitized(),
            moves: self.moves.sanitized(),
            sprint: self.sprint.sanitized(),
        }
    }
}
