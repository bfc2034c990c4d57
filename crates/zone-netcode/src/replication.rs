//! Replicated character vitals
//!
//! Health, max health and the attached sub-actor (the equipped weapon) are
//! owned by the authority and mirrored to every observer. Delivery is
//! at-least-once and unordered, so every update carries a revision and
//! observers keep only the newest one they have seen.

use serde::{Deserialize, Serialize};

/// Opaque reference to another replicated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef(pub u64);

/// Health and attachment state of one character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health, always within `[0, max_health]`
    pub health: f32,
    /// Upper bound for health
    pub max_health: f32,
    /// Attached sub-actor, if any
    pub attachment: Option<ActorRef>,
}

impl Vitals {
    /// Health as a fraction of max health (0 when max health is 0)
    pub fn health_alpha(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Whether health has run out
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            attachment: None,
        }
    }
}

/// One replicated snapshot of [`Vitals`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsUpdate {
    /// Monotonic revision assigned by the authority
    pub revision: u64,
    /// The values at that revision
    pub vitals: Vitals,
}

/// Authority-side owner of a character's vitals
///
/// Every change bumps the revision; [`snapshot`](Self::snapshot) produces the
/// update to broadcast.
#[derive(Debug, Clone, Default)]
pub struct VitalsAuthority {
    vitals: Vitals,
    revision: u64,
}

impl VitalsAuthority {
    /// Start from the given values, clamped
    pub fn new(vitals: Vitals) -> Self {
        let mut authority = Self {
            vitals,
            revision: 0,
        };
        authority.set_max_health(vitals.max_health);
        authority.revision = 0;
        authority
    }

    /// Set health, clamped into `[0, max_health]`
    pub fn set_health(&mut self, value: f32) {
        self.vitals.health = value.clamp(0.0, self.vitals.max_health);
        self.revision += 1;
    }

    /// Add to health
    pub fn add_health(&mut self, value: f32) {
        self.set_health(self.vitals.health + value);
    }

    /// Subtract from health; returns true if this took health to zero
    pub fn subtract_health(&mut self, value: f32) -> bool {
        let was_alive = !self.vitals.is_dead();
        self.set_health(self.vitals.health - value);
        was_alive && self.vitals.is_dead()
    }

    /// Set max health (never negative) and re-clamp health
    pub fn set_max_health(&mut self, value: f32) {
        self.vitals.max_health = value.max(0.0);
        self.set_health(self.vitals.health);
    }

    /// Attach or detach the sub-actor
    pub fn set_attachment(&mut self, attachment: Option<ActorRef>) {
        self.vitals.attachment = attachment;
        self.revision += 1;
    }

    /// Current values
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Current revision
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The update to broadcast
    pub fn snapshot(&self) -> VitalsUpdate {
        VitalsUpdate {
            revision: self.revision,
            vitals: self.vitals,
        }
    }
}

/// Observer-side mirror of a character's vitals
#[derive(Debug, Clone, Default)]
pub struct ReplicatedVitals {
    vitals: Vitals,
    revision: Option<u64>,
}

impl ReplicatedVitals {
    /// Create a mirror holding the defaults until the first update
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update if it is newer than what is held
    ///
    /// Returns whether the update was applied. Duplicates and stale
    /// revisions are ignored.
    pub fn apply(&mut self, update: &VitalsUpdate) -> bool {
        if matches!(self.revision, Some(current) if update.revision <= current) {
            return false;
        }
        self.vitals = update.vitals;
        self.revision = Some(update.revision);
        true
    }

    /// Mirrored values
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Revision of the mirrored values, if any update has arrived
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamped() {
        let mut authority = VitalsAuthority::default();

        authority.add_health(50.0);
        assert_eq!(authority.vitals().health, 100.0);

        assert!(!authority.subtract_health(30.0));
        assert_eq!(authority.vitals().health, 70.0);

        assert!(authority.subtract_health(500.0));
        assert_eq!(authority.vitals().health, 0.0);
        assert!(authority.vitals().is_dead());

        // Already dead
        assert!(!authority.subtract_health(1.0));
    }

    #[test]
    fn test_lower_max_health_clamps_health() {
        let mut authority = VitalsAuthority::default();
        authority.set_max_health(40.0);
        assert_eq!(authority.vitals().health, 40.0);
        assert_eq!(authority.vitals().health_alpha(), 1.0);
    }

    #[test]
    fn test_new_clamps_without_bumping_revision() {
        let authority = VitalsAuthority::new(Vitals {
            health: 250.0,
            max_health: 100.0,
            attachment: None,
        });
        assert_eq!(authority.vitals().health, 100.0);
        assert_eq!(authority.revision(), 0);
    }

    #[test]
    fn test_health_alpha_zero_max() {
        let vitals = Vitals {
            health: 0.0,
            max_health: 0.0,
            attachment: None,
        };
        assert_eq!(vitals.health_alpha(), 0.0);
    }

    #[test]
    fn test_mirror_last_value_wins() {
        let mut authority = VitalsAuthority::default();
        let mut mirror = ReplicatedVitals::new();

        authority.subtract_health(10.0);
        let first = authority.snapshot();
        authority.set_attachment(Some(ActorRef(7)));
        let second = authority.snapshot();

        // Delivered out of order and duplicated
        assert!(mirror.apply(&second));
        assert!(!mirror.apply(&first));
        assert!(!mirror.apply(&second));

        assert_eq!(mirror.vitals().health, 90.0);
        assert_eq!(mirror.vitals().attachment, Some(ActorRef(7)));
        assert_eq!(mirror.revision(), Some(second.revision));
    }
}
