//! Device controller

use heapless::Deque;

use super::calibration::{self, average_raw, CalibrationError, CalibrationKind, CalibrationReport};
use super::indicator::{led_pattern, IndicatorInputs};
use super::report::{TickReport, TransmissionReport};
use crate::config::{CalibrationProfile, MonitorConfig};
use crate::level::{GasLevel, LevelEstimator, LevelStatus};
use crate::power::{PowerEvent, PowerState, PowerSupervisor};
use crate::sampler::{SensorReading, WeightSampler};
use crate::state::{ButtonEvent, DeviceEvent, DeviceState};
use crate::telemetry::{Diagnostics, MessageKind, TelemetryFormatter};
use crate::traits::{
    BatteryAdc, CalibrationStore, LedPattern, LoadCell, StatusIndicator, Transport, Watchdog,
};
use crate::transmission::{TransmissionManager, TransmissionOutcome, TransmissionState};

/// Pending button presses held between ticks
const BUTTON_QUEUE_LEN: usize = 4;

/// Level reported while the load cell has never produced a reading
const NO_READING_LEVEL: GasLevel = GasLevel {
    percentage: 0.0,
    status: LevelStatus::Critical,
};

/// Hardware collaborators owned by the controller
pub struct DeviceIo<S, B, T, K, L, W> {
    pub load_cell: S,
    pub battery: B,
    pub transport: T,
    pub store: K,
    pub indicator: L,
    pub watchdog: W,
}

/// Top-level scheduler
///
/// Single-threaded and cooperative: each `tick` runs to completion, with
/// suspension only inside the transport and store calls.
pub struct DeviceController<'c, S, B, T, K, L, W> {
    config: &'c MonitorConfig,
    io: DeviceIo<S, B, T, K, L, W>,
    state: DeviceState,
    profile: CalibrationProfile,
    sampler: WeightSampler,
    estimator: LevelEstimator,
    formatter: TelemetryFormatter,
    transmission: TransmissionManager,
    power: PowerSupervisor,
    buttons: Deque<ButtonEvent, BUTTON_QUEUE_LEN>,
    last_level: Option<GasLevel>,
    led: LedPattern,
}

impl<'c, S, B, T, K, L, W> DeviceController<'c, S, B, T, K, L, W>
where
    S: LoadCell,
    B: BatteryAdc,
    T: Transport,
    K: CalibrationStore,
    L: StatusIndicator,
    W: Watchdog,
{
    /// Create a controller with the active calibration profile
    pub fn new(
        config: &'c MonitorConfig,
        io: DeviceIo<S, B, T, K, L, W>,
        profile: CalibrationProfile,
    ) -> Self {
        Self {
            config,
            io,
            state: DeviceState::Booting,
            profile,
            sampler: WeightSampler::new(&config.filter),
            estimator: LevelEstimator::new(&config.thresholds),
            formatter: TelemetryFormatter,
            transmission: TransmissionManager::new(config),
            power: PowerSupervisor::new(&config.power),
            buttons: Deque::new(),
            last_level: None,
            led: LedPattern::Off,
        }
    }

    /// Finish boot and start running
    pub fn boot(&mut self) {
        self.io.watchdog.feed();
        self.state = self.state.transition(DeviceEvent::BootComplete);
        self.update_indicator();
    }

    /// Queue a button press for the next tick
    ///
    /// Returns `false` if the queue is full and the press was dropped.
    pub fn handle_button(&mut self, event: ButtonEvent) -> bool {
        self.buttons.push_back(event).is_ok()
    }

    /// Leave the sleeping state
    pub fn wake(&mut self) {
        if self.state == DeviceState::Sleeping {
            self.power.wake();
            self.state = self.state.transition(DeviceEvent::WakeUp);
            self.update_indicator();
        }
    }

    /// Run one scheduling pass
    pub async fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::new(now_ms, self.state);

        if self.state.feeds_watchdog() {
            self.io.watchdog.feed();
        }

        if self.state.samples() {
            while let Some(event) = self.buttons.pop_front() {
                report.calibration = Some(self.run_calibration(event.into()).await);
            }

            let interval = self
                .power
                .read_interval_ms(self.config.timing.sensor_read_interval_ms);
            if self.sampler.is_due(now_ms, interval) {
                self.check_battery(&mut report);
                self.run_pipeline(now_ms, &mut report).await;

                if self.state == DeviceState::Running && self.power.should_sleep() {
                    report.sleep_ms = Some(self.power.enter_sleep());
                    self.state = self.state.transition(DeviceEvent::SleepRequested);
                }
            }
        }

        self.update_indicator();
        report.state = self.state;
        report.led = self.led;
        report
    }

    async fn run_calibration(&mut self, kind: CalibrationKind) -> CalibrationReport {
        self.state = self.state.transition(DeviceEvent::CalibrationStarted);
        self.update_indicator();

        let result = self.calibrate(kind).await;

        self.state = self.state.transition(DeviceEvent::CalibrationFinished);
        CalibrationReport { kind, result }
    }

    async fn calibrate(
        &mut self,
        kind: CalibrationKind,
    ) -> Result<CalibrationProfile, CalibrationError> {
        let cal = &self.config.calibration;
        let average = average_raw(&mut self.io.load_cell, &mut self.io.watchdog, cal.samples)?;
        let next = calibration::apply(kind, &self.profile, average, cal.reference_weight_kg)?;

        // Old-scale readings must not be mixed into the filter
        self.profile = next;
        self.sampler.reset();
        self.last_level = None;

        self.io.watchdog.feed();
        self.io.store.save(&next).await?;
        Ok(next)
    }

    fn check_battery(&mut self, report: &mut TickReport) {
        match self.io.battery.read_raw() {
            Ok(raw) => {
                report.power = Some(self.power.monitor(raw));
            }
            Err(e) => report.battery_error = Some(e),
        }

        let event = self.power.take_event();
        if event == Some(PowerEvent::LowBattery) {
            self.transmission.flag_low_battery();
        }
        report.power_event = event;
    }

    async fn run_pipeline(&mut self, now_ms: u64, report: &mut TickReport) {
        let sample = self.sampler.sample(&mut self.io.load_cell, &self.profile, now_ms);
        report.sensor_error = self.sampler.last_error();

        // Without any good reading the fault still goes out under a
        // placeholder level
        let (level, reading) = match sample {
            Ok(reading) => {
                let level = self.estimator.estimate(&reading, &self.profile);
                self.last_level = Some(level);
                report.reading = Some(reading);
                report.level = Some(level);
                (level, Some(reading))
            }
            Err(_) => (NO_READING_LEVEL, None),
        };

        let Some(reason) = self.transmission.next_transmission(now_ms, &level) else {
            return;
        };

        let kind = if reason.is_heartbeat() {
            MessageKind::Heartbeat
        } else {
            MessageKind::Telemetry
        };
        let device = &self.config.device;
        let message = self
            .formatter
            .format(
                &device.device_id,
                &level,
                self.power.state().battery_percent,
                &device.firmware_version,
                now_ms,
            )
            .with_kind(kind)
            .with_diagnostics(self.diagnostics(reading.as_ref()));

        let (topic, payload) = match (message.topic(), message.to_json()) {
            (Ok(topic), Ok(payload)) => (topic, payload),
            (Err(e), _) | (_, Err(e)) => {
                report.telemetry_error = Some(e);
                return;
            }
        };

        self.transmission.begin_attempt(now_ms, reason, &level);
        let delivered = self.io.transport.publish(&topic, payload.as_bytes()).await;
        let outcome = self.transmission.record_result(delivered);

        if outcome == TransmissionOutcome::RestartRequired {
            self.state = self.state.transition(DeviceEvent::RestartRequired);
        }
        report.transmission = Some(TransmissionReport { reason, outcome });
    }

    fn diagnostics(&self, reading: Option<&SensorReading>) -> Diagnostics {
        Diagnostics {
            weight_kg: reading.map_or(0.0, |r| r.filtered_weight_kg),
            stale: reading.map_or(true, |r| r.stale),
            low_battery: self.power.state().low_battery,
            tx_failures: self.transmission.consecutive_failures(),
            sensor_fault: self.sampler.last_error().is_some(),
            fault_count: self.sampler.fault_count(),
        }
    }

    fn update_indicator(&mut self) {
        let pattern = led_pattern(&IndicatorInputs {
            state: self.state,
            status: self.last_level.map(|l| l.status),
            low_battery: self.power.state().low_battery,
            sensor_fault: self.sampler.last_error().is_some(),
            transmission_failing: self.transmission.is_failing(),
        });
        if pattern != self.led {
            self.led = pattern;
            self.io.indicator.set_pattern(pattern);
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Calibration currently applied to readings
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn last_level(&self) -> Option<&GasLevel> {
        self.last_level.as_ref()
    }

    pub fn power_state(&self) -> &PowerState {
        self.power.state()
    }

    pub fn transmission_state(&self) -> &TransmissionState {
        self.transmission.state()
    }

    pub fn led(&self) -> LedPattern {
        self.led
    }

    pub fn io(&self) -> &DeviceIo<S, B, T, K, L, W> {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut DeviceIo<S, B, T, K, L, W> {
        &mut self.io
    }
}
