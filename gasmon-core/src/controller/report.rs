//! Per-tick summary for logging

use super::calibration::CalibrationReport;
use crate::level::GasLevel;
use crate::power::{PowerEvent, PowerState};
use crate::sampler::SensorReading;
use crate::state::DeviceState;
use crate::telemetry::TelemetryError;
use crate::traits::{LedPattern, SensorError};
use crate::transmission::{TransmissionOutcome, TransmitReason};

/// One send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmissionReport {
    pub reason: TransmitReason,
    pub outcome: TransmissionOutcome,
}

/// What happened during one `tick`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub now_ms: u64,
    /// State after the tick
    pub state: DeviceState,
    /// Routine run for queued button input
    pub calibration: Option<CalibrationReport>,
    /// Battery status, when it was measured this tick
    pub power: Option<PowerState>,
    pub battery_error: Option<SensorError>,
    pub power_event: Option<PowerEvent>,
    /// Sample taken this tick (possibly stale)
    pub reading: Option<SensorReading>,
    pub sensor_error: Option<SensorError>,
    pub level: Option<GasLevel>,
    pub transmission: Option<TransmissionReport>,
    pub telemetry_error: Option<TelemetryError>,
    /// Sleep duration requested at the end of the tick (ms)
    pub sleep_ms: Option<u32>,
    pub led: LedPattern,
}

impl TickReport {
    pub(crate) fn new(now_ms: u64, state: DeviceState) -> Self {
        Self {
            now_ms,
            state,
            calibration: None,
            power: None,
            battery_error: None,
            power_event: None,
            reading: None,
            sensor_error: None,
            level: None,
            transmission: None,
            telemetry_error: None,
            sleep_ms: None,
            led: LedPattern::Off,
        }
    }

    /// Check whether the sampling pipeline ran
    pub fn sampled(&self) -> bool {
        self.reading.is_some() || self.sensor_error.is_some()
    }

    /// Check whether the device must be reset
    pub fn restart_required(&self) -> bool {
        self.state == DeviceState::Restarting
    }
}
