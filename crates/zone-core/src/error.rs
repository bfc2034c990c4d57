//! Error types for zone-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Invalid period: {0} (must be finite and greater than zero)")]
    InvalidPeriod(f64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
