//! Transmission scheduling and failure accounting
//!
//! Decides when telemetry goes out and tracks consecutive delivery
//! failures. After a failure nothing is sent until a full data interval has
//! elapsed since the failed attempt.

use crate::config::MonitorConfig;
use crate::level::{significant_change, GasLevel};

/// Why a message is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitReason {
    /// Battery dropped below the low threshold
    LowBattery,
    /// No level has been delivered since boot
    Startup,
    /// Level moved by at least the change threshold
    Change,
    /// Data interval elapsed
    Periodic,
    /// Heartbeat interval elapsed
    Heartbeat,
}

impl TransmitReason {
    /// Heartbeats go to their own topic
    pub const fn is_heartbeat(&self) -> bool {
        matches!(self, TransmitReason::Heartbeat)
    }
}

/// Result of recording a transmission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmissionOutcome {
    Delivered,
    Failed { consecutive_failures: u8 },
    /// Failure limit reached; reported once per failure streak
    RestartRequired,
}

/// Transmission bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmissionState {
    /// Time of the last successful send (ms)
    pub last_sent_ms: u64,
    /// Percentage carried by the last successful send
    pub last_sent_level: Option<f32>,
    pub consecutive_failures: u8,
    /// Time of the last successful heartbeat (ms)
    pub last_heartbeat_ms: u64,
    /// Time of the most recent attempt, successful or not (ms)
    pub last_attempt_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct PendingAttempt {
    at_ms: u64,
    reason: TransmitReason,
    percentage: f32,
}

/// Decides when to transmit and counts failures
#[derive(Debug, Clone)]
pub struct TransmissionManager {
    data_interval_ms: u64,
    heartbeat_interval_ms: u64,
    change_percent: f32,
    max_failures: u8,
    state: TransmissionState,
    pending: Option<PendingAttempt>,
    low_battery_pending: bool,
}

impl TransmissionManager {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_state(config, TransmissionState::default())
    }

    /// Resume from saved bookkeeping
    pub fn with_state(config: &MonitorConfig, state: TransmissionState) -> Self {
        Self {
            data_interval_ms: config.timing.data_transmission_interval_ms as u64,
            heartbeat_interval_ms: config.timing.heartbeat_interval_ms as u64,
            change_percent: config.thresholds.change_percent,
            max_failures: config.safety.max_transmission_failures,
            state,
            pending: None,
            low_battery_pending: false,
        }
    }

    /// Check whether anything should be sent now
    pub fn should_transmit_now(&self, now_ms: u64, level: &GasLevel) -> bool {
        self.next_transmission(now_ms, level).is_some()
    }

    /// Highest-priority reason to transmit now, if any
    pub fn next_transmission(&self, now_ms: u64, level: &GasLevel) -> Option<TransmitReason> {
        if self.in_retry_backoff(now_ms) {
            return None;
        }

        if self.low_battery_pending {
            return Some(TransmitReason::LowBattery);
        }

        match self.state.last_sent_level {
            None => return Some(TransmitReason::Startup),
            Some(previous)
                if significant_change(previous, level.percentage, self.change_percent) =>
            {
                return Some(TransmitReason::Change)
            }
            Some(_) => {}
        }

        // A due heartbeat replaces the periodic send
        if now_ms.saturating_sub(self.state.last_heartbeat_ms) >= self.heartbeat_interval_ms {
            return Some(TransmitReason::Heartbeat);
        }

        if now_ms.saturating_sub(self.state.last_sent_ms) >= self.data_interval_ms {
            return Some(TransmitReason::Periodic);
        }

        None
    }

    fn in_retry_backoff(&self, now_ms: u64) -> bool {
        if self.state.consecutive_failures == 0 {
            return false;
        }
        match self.state.last_attempt_ms {
            Some(attempt) => now_ms.saturating_sub(attempt) < self.data_interval_ms,
            None => false,
        }
    }

    /// Record that a send is starting
    pub fn begin_attempt(&mut self, now_ms: u64, reason: TransmitReason, level: &GasLevel) {
        self.state.last_attempt_ms = Some(now_ms);
        self.pending = Some(PendingAttempt {
            at_ms: now_ms,
            reason,
            percentage: level.percentage,
        });
    }

    /// Record the result of the attempt started with `begin_attempt`
    pub fn record_result(&mut self, success: bool) -> TransmissionOutcome {
        let pending = self.pending.take();

        if success {
            self.state.consecutive_failures = 0;
            if let Some(attempt) = pending {
                self.state.last_sent_ms = attempt.at_ms;
                self.state.last_sent_level = Some(attempt.percentage);
                match attempt.reason {
                    TransmitReason::Heartbeat => self.state.last_heartbeat_ms = attempt.at_ms,
                    TransmitReason::LowBattery => self.low_battery_pending = false,
                    _ => {}
                }
            }
            return TransmissionOutcome::Delivered;
        }

        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        if self.state.consecutive_failures == self.max_failures {
            TransmissionOutcome::RestartRequired
        } else {
            TransmissionOutcome::Failed {
                consecutive_failures: self.state.consecutive_failures,
            }
        }
    }

    /// Queue a low-battery notification for the next send window
    pub fn flag_low_battery(&mut self) {
        self.low_battery_pending = true;
    }

    pub fn state(&self) -> &TransmissionState {
        &self.state
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.state.consecutive_failures
    }

    /// True while at least one send has failed since the last success
    pub fn is_failing(&self) -> bool {
        self.state.consecutive_failures > 0
    }
}
