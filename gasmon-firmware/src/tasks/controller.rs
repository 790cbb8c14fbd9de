//! Main controller task
//!
//! Drives the core `DeviceController` from a fixed ticker, feeds it button
//! input, cycles the load cell through sleep and resets the chip when the
//! controller gives up on the network.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker, Timer};

use gasmon_core::config::{CalibrationProfile, MonitorConfig};
use gasmon_core::controller::{DeviceIo, TickReport};
use gasmon_core::power::PowerEvent;
use gasmon_core::state::DeviceState;
use gasmon_core::transmission::TransmissionOutcome;
use gasmon_drivers::sensor::POWER_UP_SETTLE_US;

use crate::board::{BatteryDriver, Controller, LoadCellDriver};
use crate::channels::BUTTON_EVENTS;
use crate::io::{FlashCalibrationStore, HardwareWatchdog, SignalIndicator};
use crate::link::LinkTransport;

/// Scheduling resolution; sampling cadence comes from the configuration
pub const TICK_INTERVAL_MS: u64 = 100;

/// Time for the final log lines to drain before a reset
const RESTART_DELAY_MS: u64 = 100;

type Io = DeviceIo<
    LoadCellDriver,
    BatteryDriver,
    LinkTransport,
    FlashCalibrationStore,
    SignalIndicator,
    HardwareWatchdog,
>;

#[embassy_executor::task]
pub async fn controller_task(
    config: &'static MonitorConfig,
    mut io: Io,
    profile: CalibrationProfile,
) {
    info!("Controller task started");

    io.watchdog.start(config.safety.watchdog_timeout_ms);

    let mut controller: Controller = Controller::new(config, io, profile);
    controller.boot();
    info!("Boot complete, running");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let start = Instant::now();
    let mut wake_at: Option<u64> = None;

    loop {
        if let Either::First(event) = select(BUTTON_EVENTS.receive(), ticker.next()).await {
            if !controller.handle_button(event) {
                warn!("Button queue full, dropping {:?}", event);
            }
            continue;
        }

        let mut now_ms = start.elapsed().as_millis();

        if let Some(at) = wake_at {
            if now_ms >= at && controller.state() == DeviceState::Sleeping {
                wake_at = None;
                controller.io_mut().load_cell.power_up();
                // First conversion after power-up
                Timer::after_micros(POWER_UP_SETTLE_US as u64).await;
                controller.wake();
                now_ms = start.elapsed().as_millis();
                debug!("Woke at {} ms", now_ms);
            }
        }

        let report = controller.tick(now_ms).await;
        log_report(&report);

        if report.restart_required() {
            error!("Too many transmission failures, restarting");
            Timer::after_millis(RESTART_DELAY_MS).await;
            controller.io_mut().watchdog.reset_now();
        }

        if let Some(sleep_ms) = report.sleep_ms {
            debug!("Sleeping for {} ms", sleep_ms);
            controller.io_mut().load_cell.power_down();
            wake_at = Some(now_ms + sleep_ms as u64);
        }
    }
}

fn log_report(report: &TickReport) {
    if let Some(calibration) = &report.calibration {
        match calibration.result {
            Ok(profile) => info!(
                "{:?} calibration applied: factor={}, tare={}",
                calibration.kind, profile.calibration_factor, profile.tare_offset
            ),
            Err(e) => warn!("{:?} calibration failed: {:?}", calibration.kind, e),
        }
    }

    if let Some(e) = report.battery_error {
        warn!("Battery read failed: {:?}", e);
    }
    match (report.power_event, report.power) {
        (Some(PowerEvent::LowBattery), Some(power)) => {
            warn!("Battery low: {}%", power.battery_percent)
        }
        (Some(PowerEvent::Recovered), Some(power)) => {
            info!("Battery recovered: {}%", power.battery_percent)
        }
        _ => {}
    }

    if let Some(e) = report.sensor_error {
        warn!("Load cell fault: {:?}", e);
    }
    if let (Some(reading), Some(level)) = (report.reading, report.level) {
        debug!(
            "Weight {} kg, level {}% ({}){}",
            reading.filtered_weight_kg,
            level.percentage,
            level.status.as_str(),
            if reading.stale { " stale" } else { "" }
        );
    }

    if let Some(e) = report.telemetry_error {
        error!("Telemetry formatting failed: {:?}", e);
    }
    if let Some(tx) = report.transmission {
        match tx.outcome {
            TransmissionOutcome::Delivered => info!("{:?} message delivered", tx.reason),
            TransmissionOutcome::Failed {
                consecutive_failures,
            } => warn!(
                "{:?} message failed ({} in a row)",
                tx.reason, consecutive_failures
            ),
            TransmissionOutcome::RestartRequired => {
                error!("{:?} message failed, failure limit reached", tx.reason)
            }
        }
    }
}
