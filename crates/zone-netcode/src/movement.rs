//! Sprint movement state
//!
//! Tracks whether a character is sprinting and whether its owner wants it to.
//! The two differ on purpose: `is_sprinting` drives speed selection on every
//! peer, while `wants_to_sprint` is the intent captured into predicted moves
//! and only the locally controlling peer (or the authority replaying moves)
//! writes it.

use serde::{Deserialize, Serialize};

/// Sprint tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintSettings {
    /// Whether the character may sprint at all
    pub can_sprint: bool,
    /// Maximum walk speed while sprinting (cm/s)
    pub sprint_max_speed: f32,
    /// Maximum acceleration while sprinting
    pub sprint_max_acceleration: f32,
    /// Maximum walk speed otherwise (cm/s)
    pub walk_max_speed: f32,
    /// Maximum acceleration otherwise
    pub walk_max_acceleration: f32,
}

impl SprintSettings {
    /// Replace negative or non-finite speeds with the defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let fix = |value: f32, fallback: f32| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };
        self.sprint_max_speed = fix(self.sprint_max_speed, defaults.sprint_max_speed);
        self.sprint_max_acceleration =
            fix(self.sprint_max_acceleration, defaults.sprint_max_acceleration);
        self.walk_max_speed = fix(self.walk_max_speed, defaults.walk_max_speed);
        self.walk_max_acceleration =
            fix(self.walk_max_acceleration, defaults.walk_max_acceleration);
        self
    }
}

impl Default for SprintSettings {
    fn default() -> Self {
        Self {
            can_sprint: true,
            sprint_max_speed: 600.0,
            sprint_max_acceleration: 1000.0,
            walk_max_speed: 300.0,
            walk_max_acceleration: 1000.0,
        }
    }
}

/// Network role of the peer holding a [`SprintState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRole {
    /// The server's copy; `locally_controlled` for a listen-server host
    Authority { locally_controlled: bool },
    /// The owning client's predicted copy
    AutonomousProxy,
    /// Another client's interpolated copy
    SimulatedProxy,
}

impl NetRole {
    /// Whether this peer is authoritative
    pub fn has_authority(&self) -> bool {
        matches!(self, NetRole::Authority { .. })
    }

    /// Whether input for this character originates on this peer
    pub fn is_locally_controlled(&self) -> bool {
        matches!(
            self,
            NetRole::Authority {
                locally_controlled: true
            } | NetRole::AutonomousProxy
        )
    }
}

/// Movement state the move reconciler reads from and writes to
pub trait MovementAuthority {
    /// Whether this peer's simulation is authoritative
    fn has_authority(&self) -> bool;

    /// The intent to capture into the next predicted move
    fn wants_to_sprint(&self) -> bool;

    /// Overwrite the intent (decoding a move, preparing a replay)
    fn set_wants_to_sprint(&mut self, wants_to_sprint: bool);

    /// Start sprinting if allowed; returns whether sprinting now
    fn sprint(&mut self) -> bool;

    /// Stop sprinting
    fn unsprint(&mut self);
}

/// Sprint state of one character on one peer
#[derive(Debug, Clone)]
pub struct SprintState {
    settings: SprintSettings,
    role: NetRole,
    is_sprinting: bool,
    wants_to_sprint: bool,
    simulating_physics: bool,
}

impl SprintState {
    /// Create a non-sprinting state
    pub fn new(settings: SprintSettings, role: NetRole) -> Self {
        Self {
            settings,
            role,
            is_sprinting: false,
            wants_to_sprint: false,
            simulating_physics: false,
        }
    }

    /// Whether sprinting is currently possible
    ///
    /// A body handed over to physics (ragdoll) cannot sprint.
    pub fn can_sprint(&self) -> bool {
        self.settings.can_sprint && !self.simulating_physics
    }

    /// Whether the character is sprinting
    pub fn is_sprinting(&self) -> bool {
        self.is_sprinting
    }

    /// Hand the body to physics or take it back
    pub fn set_simulating_physics(&mut self, simulating: bool) {
        self.simulating_physics = simulating;
    }

    /// Maximum speed for the current state
    pub fn max_speed(&self, is_walking: bool) -> f32 {
        if is_walking && self.is_sprinting {
            self.settings.sprint_max_speed
        } else {
            self.settings.walk_max_speed
        }
    }

    /// Maximum acceleration for the current state
    pub fn max_acceleration(&self, is_walking: bool) -> f32 {
        if is_walking && self.is_sprinting {
            self.settings.sprint_max_acceleration
        } else {
            self.settings.walk_max_acceleration
        }
    }

    /// Network role
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Tuning values
    pub fn settings(&self) -> &SprintSettings {
        &self.settings
    }
}

impl MovementAuthority for SprintState {
    fn has_authority(&self) -> bool {
        self.role.has_authority()
    }

    fn wants_to_sprint(&self) -> bool {
        self.wants_to_sprint
    }

    fn set_wants_to_sprint(&mut self, wants_to_sprint: bool) {
        self.wants_to_sprint = wants_to_sprint;
    }

    fn sprint(&mut self) -> bool {
        if self.can_sprint() {
            self.is_sprinting = true;
            if self.role.is_locally_controlled() {
                self.wants_to_sprint = true;
            }
        }
        self.is_sprinting
    }

    fn unsprint(&mut self) {
        self.is_sprinting = false;
        if self.role.is_locally_controlled() {
            self.wants_to_sprint = false;
        }
    }
}
