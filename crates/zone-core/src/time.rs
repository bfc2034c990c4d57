//! Time sources for host-driven simulation
//!
//! Provides the local clock abstraction the netcode estimators read from:
//! - `Seconds` - Clock readings and durations in seconds
//! - `TimeSource` - Anything that can report the current local time
//! - `ManualClock` - Host- or test-driven clock, advanced explicitly
//! - `MonotonicClock` - Wall clock backed by `std::time::Instant`

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A clock reading or duration, in seconds
pub type Seconds = f64;

/// Source of the local clock
///
/// Readings must be monotonic for the lifetime of a session. The origin is
/// arbitrary; only differences and offsets between peers matter.
pub trait TimeSource {
    /// Current local time in seconds
    fn now(&self) -> Seconds;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Seconds {
        (**self).now()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn now(&self) -> Seconds {
        (**self).now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same reading, so a host can keep one handle to drive
/// time while components hold another to read it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Seconds>>,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given reading
    pub fn starting_at(now: Seconds) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Set the current reading
    pub fn set(&self, now: Seconds) {
        self.now.set(now);
    }

    /// Advance the reading by `delta` seconds
    pub fn advance(&self, delta: Seconds) {
        self.now.set(self.now.get() + delta);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Seconds {
        self.now.get()
    }
}

/// Wall clock measuring seconds since it was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Seconds {
        self.origin.elapsed().as_secs_f64()
    }
}
