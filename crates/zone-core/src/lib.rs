//! Zone Core - Capability interfaces for host-driven netcode
//!
//! The netcode crates never talk to a concrete game engine. Instead they
//! depend on a handful of small capabilities that the host provides:
//! - `TimeSource` - Reads the local simulation clock in seconds
//! - `Scheduler` - Registers and cancels periodic callbacks
//!
//! Both come with in-process implementations (`ManualClock`, `MonotonicClock`,
//! `ManualScheduler`) that hosts can use directly or swap for their own.
//!
//! ## Callback model
//!
//! Everything here is single-threaded. The host owns the loop, advances the
//! scheduler, and dispatches fired timer handles back into whichever component
//! registered them.

mod error;
pub mod scheduler;
pub mod time;

pub use error::{Error, Result};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle};
pub use time::{ManualClock, MonotonicClock, Seconds, TimeSource};
