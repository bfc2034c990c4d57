//! Time-sync sessions
//!
//! [`TimeSyncSession`] is the client half: it registers the periodic probe
//! with the host scheduler, sends probes through the transport, feeds echoes
//! into a [`ClockSyncEstimator`], and tells the [`ConnectionMonitor`] when the
//! rejection streak reaches the disconnect threshold.
//!
//! [`ProbeResponder`] is the authority half: it answers each probe with its
//! own clock as soon as the probe arrives.

use crate::clock_sync::{ClockSyncEstimator, SyncOutcome, TimeEcho, TimeProbe};
use crate::config::ClockSyncConfig;
use crate::transport::ProbeTransport;
use crate::{Error, Result};
use tracing::{debug, trace, warn};
use zone_core::{Scheduler, Seconds, TimeSource, TimerHandle};

/// Decides what to do about an unhealthy connection
pub trait ConnectionMonitor {
    /// The rejected-sample streak reached the disconnect threshold
    ///
    /// Called once per streak.
    fn sync_failures_exceeded(&mut self, consecutive_failures: u32, threshold: u32);
}

/// No monitoring; escalations are only logged
impl ConnectionMonitor for () {
    fn sync_failures_exceeded(&mut self, _consecutive_failures: u32, _threshold: u32) {}
}

/// Client-side clock synchronization driver
pub struct TimeSyncSession<C, S, T, M = ()>
where
    C: TimeSource,
    S: Scheduler,
    T: ProbeTransport,
    M: ConnectionMonitor,
{
    estimator: ClockSyncEstimator,
    clock: C,
    scheduler: S,
    transport: T,
    monitor: M,
    timer: Option<TimerHandle>,
    escalated: bool,
}

impl<C, S, T, M> TimeSyncSession<C, S, T, M>
where
    C: TimeSource,
    S: Scheduler,
    T: ProbeTransport,
    M: ConnectionMonitor,
{
    /// Create a stopped session
    pub fn new(config: ClockSyncConfig, clock: C, scheduler: S, transport: T, monitor: M) -> Self {
        Self {
            estimator: ClockSyncEstimator::new(config),
            clock,
            scheduler,
            transport,
            monitor,
            timer: None,
            escalated: false,
        }
    }

    /// Register the periodic probe; the first one fires on the next dispatch
    ///
    /// Starting a running session does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.timer.is_some() {
            return Ok(());
        }
        let period = self.estimator.probe_period();
        let handle = self.scheduler.schedule_periodic(period, 0.0)?;
        self.timer = Some(handle);
        debug!(period, "time sync started");
        Ok(())
    }

    /// Cancel the periodic probe
    ///
    /// Echoes that arrive afterwards are ignored.
    pub fn stop(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
            debug!("time sync stopped");
        }
    }

    /// Whether the periodic probe is registered
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Route a fired timer; returns whether it belonged to this session
    pub fn on_timer(&mut self, handle: TimerHandle) -> Result<bool> {
        if self.timer != Some(handle) {
            return Ok(false);
        }
        self.send_probe()?;
        Ok(true)
    }

    /// Send a probe stamped with the current local time
    pub fn send_probe(&mut self) -> Result<()> {
        let probe = self.estimator.probe(self.clock.now());
        trace!(client_time = probe.client_time, "sending time probe");
        self.transport
            .send_probe(probe)
            .map_err(|e| Error::Transport(e.to_string()))
    }

    /// Process an echo from the authority
    ///
    /// Returns `None` when the session is stopped.
    pub fn on_echo(&mut self, echo: &TimeEcho) -> Option<SyncOutcome> {
        if self.timer.is_none() {
            trace!(client_time = echo.client_time, "ignoring echo after stop");
            return None;
        }

        let outcome = self.estimator.handle_echo(echo, self.clock.now());
        if outcome.is_accepted() {
            self.escalated = false;
        } else if self.estimator.should_disconnect() && !self.escalated {
            self.escalated = true;
            let failures = self.estimator.failure_count();
            let threshold = self.estimator.failures_to_disconnect();
            warn!(failures, threshold, "time sync failure threshold reached");
            self.monitor.sync_failures_exceeded(failures, threshold);
        }
        Some(outcome)
    }

    /// Estimated authority clock right now
    pub fn server_time(&self) -> Seconds {
        self.estimator.authoritative_time(self.clock.now())
    }

    /// Local clock right now
    pub fn local_time(&self) -> Seconds {
        self.clock.now()
    }

    /// The underlying estimator
    pub fn estimator(&self) -> &ClockSyncEstimator {
        &self.estimator
    }

    /// The host scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the host scheduler, for hosts that drive it through the session
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The connection monitor
    pub fn monitor(&self) -> &M {
        &self.monitor
    }
}

impl<C, S, T, M> Drop for TimeSyncSession<C, S, T, M>
where
    C: TimeSource,
    S: Scheduler,
    T: ProbeTransport,
    M: ConnectionMonitor,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// Authority-side probe answering
pub struct ProbeResponder<C: TimeSource, T: ProbeTransport> {
    clock: C,
    transport: T,
    answered: u64,
}

impl<C: TimeSource, T: ProbeTransport> ProbeResponder<C, T> {
    /// Create a responder
    pub fn new(clock: C, transport: T) -> Self {
        Self {
            clock,
            transport,
            answered: 0,
        }
    }

    /// Echo a probe back with the current authority time
    pub fn on_probe(&mut self, probe: TimeProbe) -> Result<TimeEcho> {
        let echo = TimeEcho::answer(probe, self.clock.now());
        self.transport
            .send_echo(echo)
            .map_err(|e| Error::Transport(e.to_string()))?;
        self.answered += 1;
        Ok(echo)
    }

    /// Probes answered so far
    pub fn answered(&self) -> u64 {
        self.answered
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
