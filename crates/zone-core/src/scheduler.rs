//! Periodic callback scheduling
//!
//! Components that need to act on a fixed period (the clock sync probe, for
//! one) register a timer through the `Scheduler` trait and get a
//! `TimerHandle` back. The host is responsible for noticing when a timer is
//! due and routing the handle back to its owner.
//!
//! `ManualScheduler` is the in-process implementation: the host calls
//! `advance_to` once per frame and dispatches whatever handles come back.

use crate::time::Seconds;
use crate::{Error, Result};

/// Identifies a registered periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Registers and cancels periodic callbacks
pub trait Scheduler {
    /// Register a timer firing every `period` seconds
    ///
    /// The first firing happens `first_delay` seconds from now; a delay of zero
    /// fires on the next dispatch.
    fn schedule_periodic(&mut self, period: Seconds, first_delay: Seconds) -> Result<TimerHandle>;

    /// Cancel a timer
    ///
    /// Returns false if the handle was not active. Cancelling twice is harmless.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn schedule_periodic(&mut self, period: Seconds, first_delay: Seconds) -> Result<TimerHandle> {
        (**self).schedule_periodic(period, first_delay)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        (**self).cancel(handle)
    }
}

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    period: Seconds,
    next_fire: Seconds,
}

/// Scheduler driven by explicit calls to `advance_to`
///
/// Missed periods are coalesced: if the host stalls for several periods, a
/// timer fires once and its next deadline moves past the current time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    timers: Vec<Timer>,
    next_id: u64,
    now: Seconds,
}

impl ManualScheduler {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scheduler whose clock starts at `now`
    pub fn starting_at(now: Seconds) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Move the scheduler clock forward and collect every timer that is due
    ///
    /// Handles are returned in registration order. Going backwards in time is
    /// ignored.
    pub fn advance_to(&mut self, now: Seconds) -> Vec<TimerHandle> {
        if now > self.now {
            self.now = now;
        }

        let mut fired = Vec::new();
        for timer in &mut self.timers {
            if timer.next_fire <= self.now {
                fired.push(timer.handle);
                while timer.next_fire <= self.now {
                    timer.next_fire += timer.period;
                }
            }
        }
        fired
    }

    /// Current scheduler clock
    pub fn now(&self) -> Seconds {
        self.now
    }

    /// Check whether a timer is still registered
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Next deadline of a registered timer
    pub fn next_fire(&self, handle: TimerHandle) -> Option<Seconds> {
        self.timers
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.next_fire)
    }

    /// Number of registered timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Check if no timers are registered
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&mut self, period: Seconds, first_delay: Seconds) -> Result<TimerHandle> {
        if !period.is_finite() || period <= 0.0 {
            return Err(Error::InvalidPeriod(period));
        }

        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            handle,
            period,
            next_fire: self.now + first_delay.max(0.0),
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }
}
