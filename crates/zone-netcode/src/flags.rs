//! Compressed movement flags
//!
//! A predicted move travels with a single byte of discrete movement intents.
//! The low nibble belongs to the movement core (jump, crouch and two reserved
//! bits), the high nibble holds four custom bits. This crate owns exactly one
//! of them: custom bit 0 carries the sprint intent. Every other bit passes
//! through untouched.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bitfield sent with every predicted move
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MoveFlags: u8 {
        const JUMP_PRESSED = 0x01;
        const WANTS_TO_CROUCH = 0x02;
        const RESERVED_1 = 0x04;
        const RESERVED_2 = 0x08;
        const CUSTOM_0 = 0x10;
        const CUSTOM_1 = 0x20;
        const CUSTOM_2 = 0x40;
        const CUSTOM_3 = 0x80;

        /// Sprint intent, stored in custom bit 0
        const WANTS_TO_SPRINT = Self::CUSTOM_0.bits();
    }
}

impl MoveFlags {
    /// Interpret a byte received from the wire, keeping every bit
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// The byte to put on the wire
    pub fn to_byte(self) -> u8 {
        self.bits()
    }

    /// Whether the sprint bit is set
    pub fn wants_to_sprint(self) -> bool {
        self.contains(Self::WANTS_TO_SPRINT)
    }

    /// Copy of these flags with the sprint bit set or cleared
    pub fn with_sprint(mut self, wants_to_sprint: bool) -> Self {
        self.set(Self::WANTS_TO_SPRINT, wants_to_sprint);
        self
    }

    /// The bits owned by the movement core, with the sprint bit masked out
    pub fn external(self) -> Self {
        self.difference(Self::WANTS_TO_SPRINT)
    }
}

/// Write the sprint intent into an existing flags byte
pub fn encode_sprint(byte: u8, wants_to_sprint: bool) -> u8 {
    MoveFlags::from_byte(byte).with_sprint(wants_to_sprint).to_byte()
}

/// Read the sprint intent out of a flags byte
pub fn decode_sprint(byte: u8) -> bool {
    MoveFlags::from_byte(byte).wants_to_sprint()
}
