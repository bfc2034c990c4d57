//! Error types for zone-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Pending move list overflow
    #[error("Pending move list full, {capacity} moves are awaiting acknowledgement")]
    PendingMovesFull { capacity: usize },

    /// Move timestamps must increase
    #[error("Move at {timestamp} is not newer than the last pending move at {newest}")]
    MoveOutOfOrder { timestamp: f64, newest: f64 },

    /// Move timestamps must be finite
    #[error("Move timestamp {timestamp} is not a finite number")]
    InvalidTimestamp { timestamp: f64 },

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timer registration failed
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] zone_core::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
