//! Zone Netcode - Engine-agnostic multiplayer plumbing
//!
//! This crate holds the parts of the zone netcode that do not depend on a
//! game engine:
//!
//! - **Clock Sync**: Estimate round trip, latency and the offset to the authority clock
//! - **Sessions**: Drive periodic probes through a host scheduler and transport
//! - **Prediction**: Capture sprint intent into predicted moves (compressed flags bit `0x10`)
//! - **Reconciliation**: Combine, send, acknowledge and replay pending moves
//! - **Replication**: Mirror health and attachments with last-value-wins semantics
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Client                                │
//! │  ┌─────────────────┐  ┌────────────────┐  ┌────────────────┐   │
//! │  │   SprintState   │─▶│ MoveReconciler │─▶│   PacketLink   │───┼──▶ Moves
//! │  └─────────────────┘  └────────────────┘  └────────────────┘   │
//! │           ▲ replay             ▲ MoveAck                       │
//! │  ┌─────────────────┐  ┌────────────────────┐                   │
//! │  │ TimeSyncSession │─▶│ ClockSyncEstimator │◀── TimeEcho       │
//! │  └─────────────────┘  └────────────────────┘                   │
//! └────────────────────────────────────────────────────────────────┘
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         Authority                              │
//! │  ┌─────────────────┐  ┌────────────────┐  ┌────────────────┐   │
//! │  │ ProbeResponder  │  │ ServerMoveGate │─▶│  SprintState   │   │
//! │  └─────────────────┘  └────────────────┘  └────────────────┘   │
//! │  ┌─────────────────┐                                           │
//! │  │ VitalsAuthority │──▶ VitalsUpdate ──▶ ReplicatedVitals      │
//! │  └─────────────────┘                                           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use zone_netcode::{ClockSyncConfig, ClockSyncEstimator, NetcodeConfig, TimeEcho};
//!
//! let config = NetcodeConfig::from_ron_str("(clock_sync: (round_trip_threshold: 0.25))").unwrap();
//! let mut estimator = ClockSyncEstimator::new(config.clock_sync.clone());
//!
//! let probe = estimator.probe(10.0);
//! let echo = TimeEcho::answer(probe, 10.3);
//! assert!(estimator.handle_echo(&echo, 10.2).is_accepted());
//! assert!((estimator.authoritative_time(10.2) - 10.4).abs() < 1e-9);
//!
//! // Defaults apply to everything the file leaves out
//! assert_eq!(config.clock_sync.probe_period, ClockSyncConfig::default().probe_period);
//! ```

mod clock_sync;
mod config;
mod error;
pub mod flags;
mod movement;
mod pending_moves;
mod prediction;
mod reconciliation;
mod replication;
mod session;
mod transport;

pub use clock_sync::{
    ClockSyncEstimator, RejectReason, SyncOutcome, SyncPhase, SyncSample, TimeEcho, TimeProbe,
};
pub use config::{ClockSyncConfig, MoveConfig, NetcodeConfig};
pub use error::{Error, Result};
pub use flags::MoveFlags;
pub use movement::{MovementAuthority, NetRole, SprintSettings, SprintState};
pub use pending_moves::{PendingEntry, PendingMoves};
pub use prediction::{MovementCore, PredictedMove, StandardMovementCore, WireMove};
pub use reconciliation::{MoveReconciler, ReconcileStats, ServerMoveGate};
pub use replication::{ActorRef, ReplicatedVitals, Vitals, VitalsAuthority, VitalsUpdate};
pub use session::{ConnectionMonitor, ProbeResponder, TimeSyncSession};
pub use transport::{Connection, NetPacket, PacketLink, ProbeTransport};

// Re-export the host capabilities for convenience
pub use zone_core::{Scheduler, Seconds, TimeSource, TimerHandle};
