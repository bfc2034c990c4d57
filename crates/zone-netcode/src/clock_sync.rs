//! Clock synchronization and round-trip estimation
//!
//! The client periodically sends a [`TimeProbe`] stamped with its local clock.
//! The authority answers immediately with a [`TimeEcho`] carrying both the
//! client reading it was sent and its own clock. From the echo the client
//! derives one [`SyncSample`]:
//!
//! ```text
//! round_trip = now - client_time
//! latency    = round_trip / 2
//! offset     = (server_time - now) + latency
//! ```
//!
//! Samples whose round trip exceeds the configured threshold are rejected so
//! that a stalled frame or a congested link cannot skew the offset. Accepted
//! samples go into bounded histories and the averages are recomputed from
//! them, which lets old network conditions age out on their own.
//!
//! Every echo carries its own `client_time`, so probes may be pipelined and
//! echoes may arrive in any order.

use crate::config::ClockSyncConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zone_core::Seconds;
use zone_history::SampleHistory;

/// Time-sync request, client to authority
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeProbe {
    /// Client clock when the probe was sent
    pub client_time: Seconds,
}

/// Time-sync reply, authority to client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeEcho {
    /// Client clock copied from the probe
    pub client_time: Seconds,
    /// Authority clock when the probe was answered
    pub server_time: Seconds,
}

impl TimeEcho {
    /// Answer a probe with the authority's current clock
    pub fn answer(probe: TimeProbe, server_time: Seconds) -> Self {
        Self {
            client_time: probe.client_time,
            server_time,
        }
    }
}

/// Measurements derived from one echo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncSample {
    /// Local time between sending the probe and receiving the echo
    pub round_trip: Seconds,
    /// One-way latency estimate (half the round trip)
    pub latency: Seconds,
    /// Candidate for authority clock minus local clock
    pub offset: Seconds,
}

impl SyncSample {
    /// Derive a sample from an echo received at local time `now`
    pub fn measure(echo: &TimeEcho, now: Seconds) -> Self {
        let round_trip = now - echo.client_time;
        let latency = round_trip * 0.5;
        Self {
            round_trip,
            latency,
            offset: (echo.server_time - now) + latency,
        }
    }
}

/// Why a sample was not used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The round trip exceeded the configured threshold
    OverThreshold,
    /// The round trip was negative, or a measurement was not finite
    Degenerate,
}

/// Result of processing one echo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The sample was folded into the averages
    Accepted(SyncSample),
    /// The sample was discarded
    Rejected {
        /// The discarded measurement
        sample: SyncSample,
        /// Why it was discarded
        reason: RejectReason,
        /// Rejections in a row, including this one
        consecutive_failures: u32,
    },
}

impl SyncOutcome {
    /// Whether the sample was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, SyncOutcome::Accepted(_))
    }

    /// The measurement, accepted or not
    pub fn sample(&self) -> &SyncSample {
        match self {
            SyncOutcome::Accepted(sample) | SyncOutcome::Rejected { sample, .. } => sample,
        }
    }
}

/// Where the estimator is in its probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No probe is awaiting an echo
    Idle,
    /// At least one probe has not been answered yet
    Probing,
}

/// Rolling estimate of the authority clock offset and the round-trip time
///
/// # Example
///
/// ```
/// use zone_netcode::{ClockSyncConfig, ClockSyncEstimator, TimeEcho};
///
/// let mut estimator = ClockSyncEstimator::new(ClockSyncConfig::default());
/// let probe = estimator.probe(10.0);
///
/// // The authority answers at 10.3 on its own clock; the echo lands at 10.2 locally
/// let echo = TimeEcho::answer(probe, 10.3);
/// assert!(estimator.handle_echo(&echo, 10.2).is_accepted());
///
/// assert!((estimator.offset() - 0.2).abs() < 1e-9);
/// assert!((estimator.authoritative_time(20.0) - 20.2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct ClockSyncEstimator {
    config: ClockSyncConfig,
    /// At least one sample has been accepted
    has_synced: bool,
    /// The most recent sample was accepted
    last_status: bool,
    /// Rejected samples in a row
    failure_count: u32,
    round_trip_history: SampleHistory,
    offset_history: SampleHistory,
    round_trip_average: Seconds,
    offset_average: Seconds,
    probes_sent: u64,
    echoes_received: u64,
}

impl ClockSyncEstimator {
    /// Create an estimator; the config is sanitized first
    pub fn new(config: ClockSyncConfig) -> Self {
        let config = config.sanitized();
        Self {
            round_trip_history: SampleHistory::new(config.round_trip_history),
            offset_history: SampleHistory::new(config.offset_history),
            config,
            has_synced: false,
            last_status: true,
            failure_count: 0,
            round_trip_average: 0.0,
            offset_average: 0.0,
            probes_sent: 0,
            echoes_received: 0,
        }
    }

    /// Build the probe to send at local time `now`
    pub fn probe(&mut self, now: Seconds) -> TimeProbe {
        self.probes_sent += 1;
        TimeProbe { client_time: now }
    }

    /// Process an echo received at local time `now`
    pub fn handle_echo(&mut self, echo: &TimeEcho, now: Seconds) -> SyncOutcome {
        self.echoes_received += 1;
        let sample = SyncSample::measure(echo, now);

        let degenerate = !sample.round_trip.is_finite()
            || sample.round_trip < 0.0
            || !sample.offset.is_finite();
        let reason = if degenerate {
            Some(RejectReason::Degenerate)
        } else if sample.round_trip > self.config.round_trip_threshold {
            Some(RejectReason::OverThreshold)
        } else {
            None
        };

        match reason {
            None => {
                self.offset_history.insert(sample.offset);
                self.offset_average = self.offset_history.average();
                self.round_trip_history.insert(sample.round_trip);
                self.round_trip_average = self.round_trip_history.average();

                self.has_synced = true;
                self.last_status = true;
                self.failure_count = 0;

                debug!(
                    round_trip = sample.round_trip,
                    round_trip_average = self.round_trip_average,
                    offset = sample.offset,
                    offset_average = self.offset_average,
                    "clock sync sample accepted"
                );
                SyncOutcome::Accepted(sample)
            }
            Some(reason) => {
                self.last_status = false;
                self.failure_count = self.failure_count.saturating_add(1);

                warn!(
                    round_trip = sample.round_trip,
                    threshold = self.config.round_trip_threshold,
                    ?reason,
                    consecutive_failures = self.failure_count,
                    "clock sync sample rejected"
                );
                SyncOutcome::Rejected {
                    sample,
                    reason,
                    consecutive_failures: self.failure_count,
                }
            }
        }
    }

    /// Averaged round trip, in seconds or milliseconds
    pub fn round_trip(&self, millis: bool) -> f64 {
        if millis {
            self.round_trip_average * 1000.0
        } else {
            self.round_trip_average
        }
    }

    /// Averaged one-way latency in seconds
    pub fn latency(&self) -> Seconds {
        self.round_trip_average * 0.5
    }

    /// Averaged offset: how far the local clock is behind the authority
    pub fn offset(&self) -> Seconds {
        self.offset_average
    }

    /// Estimate the authority clock at local time `local_now`
    pub fn authoritative_time(&self, local_now: Seconds) -> Seconds {
        local_now + self.offset_average
    }

    /// At least one sample has been accepted
    pub fn has_synced(&self) -> bool {
        self.has_synced
    }

    /// The most recent sample was accepted (true before any echo)
    pub fn last_status(&self) -> bool {
        self.last_status
    }

    /// Rejected samples in a row
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Failure streak at which the connection should be dropped
    pub fn failures_to_disconnect(&self) -> u32 {
        self.config.failures_to_disconnect
    }

    /// The failure streak has reached the disconnect threshold
    ///
    /// The estimator keeps working either way; acting on this is up to the
    /// connection owner.
    pub fn should_disconnect(&self) -> bool {
        self.failure_count >= self.config.failures_to_disconnect
    }

    /// Accepted round trips, newest first
    pub fn round_trip_history(&self) -> &SampleHistory {
        &self.round_trip_history
    }

    /// Accepted offsets, newest first
    pub fn offset_history(&self) -> &SampleHistory {
        &self.offset_history
    }

    /// Seconds between probes
    pub fn probe_period(&self) -> Seconds {
        self.config.probe_period
    }

    /// Longest accepted round trip in seconds
    pub fn round_trip_threshold(&self) -> Seconds {
        self.config.round_trip_threshold
    }

    /// Whether any probe is still unanswered
    pub fn phase(&self) -> SyncPhase {
        if self.probes_sent > self.echoes_received {
            SyncPhase::Probing
        } else {
            SyncPhase::Idle
        }
    }

    /// Number of probes built so far
    pub fn probes_sent(&self) -> u64 {
        self.probes_sent
    }

    /// Number of echoes processed so far
    pub fn echoes_received(&self) -> u64 {
        self.echoes_received
    }

    /// Forget every sample and return to the unsynced state
    pub fn reset(&mut self) {
        self.round_trip_history.clear();
        self.offset_history.clear();
        self.round_trip_average = 0.0;
        self.offset_average = 0.0;
        self.has_synced = false;
        self.last_status = true;
        self.failure_count = 0;
        self.probes_sent = 0;
        self.echoes_received = 0;
    }
}

impl Default for ClockSyncEstimator {
    fn default() -> Self {
        Self::new(ClockSyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn echo(client_time: Seconds, server_time: Seconds) -> TimeEcho {
        TimeEcho {
            client_time,
            server_time,
        }
    }

    #[test]
    fn test_initial_state() {
        let estimator = ClockSyncEstimator::default();
        assert!(!estimator.has_synced());
        assert!(estimator.last_status());
        assert_eq!(estimator.failure_count(), 0);
        assert_eq!(estimator.round_trip(false), 0.0);
        assert_eq!(estimator.offset(), 0.0);
        assert_eq!(estimator.authoritative_time(7.0), 7.0);
        assert_eq!(estimator.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_measure() {
        let sample = SyncSample::measure(&echo(10.0, 10.3), 10.2);
        assert!((sample.round_trip - 0.2).abs() < EPS);
        assert!((sample.latency - 0.1).abs() < EPS);
        assert!((sample.offset - 0.2).abs() < EPS);
    }

    #[test]
    fn test_accepted_sample() {
        let mut estimator = ClockSyncEstimator::default();
        // Start with a failure so the reset is visible
        estimator.handle_echo(&echo(0.0, 0.0), 0.5);
        assert_eq!(estimator.failure_count(), 1);

        let outcome = estimator.handle_echo(&echo(10.0, 10.3), 10.2);

        assert!(outcome.is_accepted());
        assert_eq!(estimator.offset_history().len(), 1);
        assert!((estimator.offset_history().latest().unwrap() - 0.2).abs() < EPS);
        assert!((estimator.round_trip_history().latest().unwrap() - 0.2).abs() < EPS);
        assert!((estimator.offset() - 0.2).abs() < EPS);
        assert!((estimator.round_trip(false) - 0.2).abs() < EPS);
        assert!((estimator.round_trip(true) - 200.0).abs() < 1e-6);
        assert!((estimator.latency() - 0.1).abs() < EPS);
        assert!(estimator.has_synced());
        assert!(estimator.last_status());
        assert_eq!(estimator.failure_count(), 0);
    }

    #[test]
    fn test_rejected_sample_over_threshold() {
        let mut estimator = ClockSyncEstimator::default();
        estimator.handle_echo(&echo(10.0, 10.3), 10.2);
        let offsets_before: Vec<_> = estimator.offset_history().values().collect();

        // Round trip 0.5 against the default 0.4 threshold
        let outcome = estimator.handle_echo(&echo(20.0, 20.0), 20.5);

        match outcome {
            SyncOutcome::Rejected {
                reason,
                consecutive_failures,
                sample,
            } => {
                assert_eq!(reason, RejectReason::OverThreshold);
                assert_eq!(consecutive_failures, 1);
                assert!((sample.round_trip - 0.5).abs() < EPS);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(!estimator.last_status());
        assert_eq!(estimator.failure_count(), 1);
        assert_eq!(
            estimator.offset_history().values().collect::<Vec<_>>(),
            offsets_before
        );
        assert_eq!(estimator.round_trip_history().len(), 1);
        // Still synced from the first sample
        assert!(estimator.has_synced());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let config = ClockSyncConfig {
            round_trip_threshold: 0.5,
            ..ClockSyncConfig::default()
        };
        let mut estimator = ClockSyncEstimator::new(config);
        assert!(estimator.handle_echo(&echo(1.0, 1.0), 1.5).is_accepted());
    }

    #[test]
    fn test_negative_round_trip_is_degenerate() {
        let mut estimator = ClockSyncEstimator::default();
        let outcome = estimator.handle_echo(&echo(5.0, 5.0), 4.0);

        assert!(matches!(
            outcome,
            SyncOutcome::Rejected {
                reason: RejectReason::Degenerate,
                ..
            }
        ));
        assert!(estimator.offset_history().is_empty());
        assert!(!estimator.has_synced());
    }

    #[test]
    fn test_non_finite_server_time_is_degenerate() {
        let mut estimator = ClockSyncEstimator::default();
        assert!(estimator.handle_echo(&echo(10.0, 10.3), 10.2).is_accepted());
        let offset = estimator.offset();

        for server_time in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let outcome = estimator.handle_echo(&echo(20.0, server_time), 20.1);
            assert!(matches!(
                outcome,
                SyncOutcome::Rejected {
                    reason: RejectReason::Degenerate,
                    ..
                }
            ));
        }

        assert_eq!(estimator.offset_history().len(), 1);
        assert_eq!(estimator.offset(), offset);
        assert!(estimator.authoritative_time(20.1).is_finite());
        assert_eq!(estimator.failure_count(), 3);
    }

    #[test]
    fn test_should_disconnect_after_streak() {
        let mut estimator = ClockSyncEstimator::default();
        for i in 0..4 {
            estimator.handle_echo(&echo(i as f64, 0.0), i as f64 + 1.0);
            assert!(!estimator.should_disconnect());
        }
        estimator.handle_echo(&echo(10.0, 0.0), 11.0);
        assert_eq!(estimator.failure_count(), 5);
        assert!(estimator.should_disconnect());

        // One good sample clears the streak
        estimator.handle_echo(&echo(20.0, 20.0), 20.1);
        assert!(!estimator.should_disconnect());
    }

    #[test]
    fn test_averages_follow_histories() {
        let config = ClockSyncConfig {
            offset_history: 3,
            round_trip_history: 2,
            ..ClockSyncConfig::default()
        };
        let mut estimator = ClockSyncEstimator::new(config);

        // Offsets 0.1, 0.2, 0.3, 0.4 with a 0.2 round trip each
        for (i, offset) in [0.1, 0.2, 0.3, 0.4].iter().enumerate() {
            let sent = i as f64 * 10.0;
            let now = sent + 0.2;
            let server_time = now + offset - 0.1;
            assert!(estimator.handle_echo(&echo(sent, server_time), now).is_accepted());
        }

        // Only the three newest offsets remain
        assert_eq!(estimator.offset_history().len(), 3);
        assert!((estimator.offset() - 0.3).abs() < 1e-6);
        assert!((estimator.offset() - estimator.offset_history().average()).abs() < EPS);
        assert_eq!(estimator.round_trip_history().len(), 2);
        assert!((estimator.round_trip(false) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_pipelined_echoes_out_of_order() {
        let mut estimator = ClockSyncEstimator::default();
        let first = estimator.probe(1.0);
        let second = estimator.probe(1.1);
        assert_eq!(estimator.phase(), SyncPhase::Probing);

        // Second echo overtakes the first
        let b = estimator.handle_echo(&TimeEcho::answer(second, 2.15), 1.2);
        let a = estimator.handle_echo(&TimeEcho::answer(first, 2.1), 1.25);

        assert!((b.sample().round_trip - 0.1).abs() < EPS);
        assert!((a.sample().round_trip - 0.25).abs() < EPS);
        assert_eq!(estimator.phase(), SyncPhase::Idle);
        assert_eq!(estimator.probes_sent(), 2);
        assert_eq!(estimator.echoes_received(), 2);
    }

    #[test]
    fn test_reset() {
        let mut estimator = ClockSyncEstimator::default();
        estimator.probe(10.0);
        estimator.handle_echo(&echo(10.0, 10.3), 10.2);
        estimator.reset();

        assert!(!estimator.has_synced());
        assert_eq!(estimator.offset(), 0.0);
        assert!(estimator.offset_history().is_empty());
        assert_eq!(estimator.probes_sent(), 0);
    }
}
