//! Controller scheduling tests driven through in-memory collaborators

mod common;

use common::*;
use embassy_futures::block_on;

use gasmon_core::config::MonitorConfig;
use gasmon_core::controller::{CalibrationError, CalibrationKind};
use gasmon_core::level::LevelStatus;
use gasmon_core::power::PowerEvent;
use gasmon_core::state::{ButtonEvent, DeviceState};
use gasmon_core::traits::{LedPattern, SensorError, StoreError};
use gasmon_core::transmission::{TransmissionOutcome, TransmitReason};

#[test]
fn test_boot_enters_running() {
    let config = MonitorConfig::default();
    let controller = booted(&config, 22.0);
    assert_eq!(controller.state(), DeviceState::Running);
    assert_eq!(controller.io().watchdog.feeds, 1);
    assert_eq!(controller.led(), LedPattern::Heartbeat);
}

#[test]
fn test_startup_tick_publishes_telemetry() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);

    let report = block_on(controller.tick(0));

    let level = report.level.unwrap();
    assert_eq!(level.percentage, 50.0);
    assert_eq!(level.status, LevelStatus::Normal);
    let tx = report.transmission.unwrap();
    assert_eq!(tx.reason, TransmitReason::Startup);
    assert_eq!(tx.outcome, TransmissionOutcome::Delivered);

    let (topic, payload) = &controller.io().transport.published[0];
    assert_eq!(topic, "devices/easygas_sensor_001/telemetry");
    assert_eq!(
        payload,
        "{\"device_id\":\"easygas_sensor_001\",\"percentage\":50.0,\"status\":\"normal\",\
         \"battery_percent\":100.0,\"firmware_version\":\"1.0.0\",\"timestamp_ms\":0,\
         \"kind\":\"telemetry\",\"weight_kg\":22.0,\"stale\":false,\"low_battery\":false,\
         \"tx_failures\":0,\"sensor_fault\":false,\"fault_count\":0}"
    );
}

#[test]
fn test_sampling_waits_for_read_interval() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);

    block_on(controller.tick(0));
    let report = block_on(controller.tick(4_999));
    assert!(!report.sampled());
    assert_eq!(controller.io().load_cell.reads, 1);

    let report = block_on(controller.tick(5_000));
    assert!(report.sampled());
    // Level unchanged and no interval elapsed
    assert!(report.transmission.is_none());
    assert_eq!(controller.io().transport.published.len(), 1);
}

#[test]
fn test_significant_change_sends_out_of_cycle() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    block_on(controller.tick(0));

    // Median of [22.0, 22.2] is about 50.7 %
    controller.io_mut().load_cell.steady = Ok(raw_for_kg(22.2));
    let report = block_on(controller.tick(5_000));
    assert!(report.transmission.is_none());

    // Median 22.2 kg, about 51.4 %
    controller.io_mut().load_cell.steady = Ok(raw_for_kg(25.0));
    let report = block_on(controller.tick(10_000));
    assert!(report.transmission.is_none());

    // Median 23.6 kg, about 61.4 %
    let report = block_on(controller.tick(15_000));
    let tx = report.transmission.unwrap();
    assert_eq!(tx.reason, TransmitReason::Change);
    assert_eq!(controller.io().transport.published.len(), 2);
}

#[test]
fn test_periodic_send_after_data_interval() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    block_on(controller.tick(0));

    let report = block_on(controller.tick(30_000));
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Periodic);
}

#[test]
fn test_heartbeat_topic() {
    let mut config = MonitorConfig::default();
    config.timing.data_transmission_interval_ms = 600_000;
    let mut controller = booted(&config, 22.0);
    block_on(controller.tick(0));

    let report = block_on(controller.tick(300_000));
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Heartbeat);

    let (topic, payload) = &controller.io().transport.published[1];
    assert_eq!(topic, "devices/easygas_sensor_001/heartbeat");
    assert!(payload.contains("\"kind\":\"heartbeat\""));
    assert_eq!(controller.transmission_state().last_heartbeat_ms, 300_000);
}

fn heartbeats_over(controller: &mut TestController<'_>, until_ms: u64, step_ms: u64) -> usize {
    let mut now = 0;
    while now <= until_ms {
        block_on(controller.tick(now));
        now += step_ms;
    }
    controller
        .io()
        .transport
        .published
        .iter()
        .filter(|(topic, _)| topic.ends_with("/heartbeat"))
        .count()
}

#[test]
fn test_heartbeat_with_read_interval_at_data_interval() {
    let mut config = MonitorConfig::default();
    config.timing.sensor_read_interval_ms = 30_000;
    let mut controller = booted(&config, 22.0);

    assert_eq!(heartbeats_over(&mut controller, 1_200_000, 30_000), 4);
    assert_eq!(controller.transmission_state().last_heartbeat_ms, 1_200_000);
}

#[test]
fn test_heartbeat_while_low_battery_stretches_reads() {
    let mut config = MonitorConfig::default();
    config.power.low_battery_interval_factor = 6;
    let mut controller = booted(&config, 22.0);
    controller.io_mut().battery.raw = Ok(0);

    assert_eq!(heartbeats_over(&mut controller, 1_200_000, 5_000), 4);
    assert!(controller.power_state().low_battery);
}

#[test]
fn test_restart_after_max_failures() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().transport.online = false;

    for (i, now) in [0u64, 30_000, 60_000, 90_000].into_iter().enumerate() {
        let report = block_on(controller.tick(now));
        assert_eq!(
            report.transmission.unwrap().outcome,
            TransmissionOutcome::Failed {
                consecutive_failures: i as u8 + 1
            }
        );
        assert_eq!(report.state, DeviceState::Running);
    }

    let report = block_on(controller.tick(120_000));
    assert_eq!(
        report.transmission.unwrap().outcome,
        TransmissionOutcome::RestartRequired
    );
    assert!(report.restart_required());
    assert_eq!(report.led, LedPattern::Off);

    // Watchdog is starved from here on
    let feeds = controller.io().watchdog.feeds;
    let report = block_on(controller.tick(150_000));
    assert!(!report.sampled());
    assert_eq!(controller.io().watchdog.feeds, feeds);
    assert_eq!(controller.io().transport.published.len(), 5);
}

#[test]
fn test_failed_send_waits_for_next_cycle() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().transport.online = false;
    block_on(controller.tick(0));
    assert_eq!(controller.led(), LedPattern::DoubleBlink);

    controller.io_mut().transport.online = true;
    let report = block_on(controller.tick(5_000));
    assert!(report.sampled());
    assert!(report.transmission.is_none());

    let report = block_on(controller.tick(30_000));
    let tx = report.transmission.unwrap();
    assert_eq!(tx.reason, TransmitReason::Startup);
    assert_eq!(tx.outcome, TransmissionOutcome::Delivered);
    assert!(controller.io().transport.published[1]
        .1
        .contains("\"tx_failures\":1"));
    assert_eq!(controller.led(), LedPattern::Heartbeat);
}

#[test]
fn test_sensor_fault_without_history_still_reports() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().load_cell.steady = Err(SensorError::Disconnected);

    let report = block_on(controller.tick(0));
    assert_eq!(report.sensor_error, Some(SensorError::Disconnected));
    assert!(report.level.is_none());
    assert!(report.reading.is_none());
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Startup);
    assert_eq!(report.led, LedPattern::Flicker);
    let payload = &controller.io().transport.published[0].1;
    assert!(payload.contains("\"status\":\"critical\""));
    assert!(payload.contains("\"stale\":true"));
    assert!(payload.contains("\"sensor_fault\":true,\"fault_count\":1}"));

    let report = block_on(controller.tick(5_000));
    assert!(report.transmission.is_none());

    // Dead sensor keeps the regular cadence
    let report = block_on(controller.tick(30_000));
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Periodic);
    assert!(controller.io().transport.published[1]
        .1
        .contains("\"fault_count\":3}"));

    // First good reading goes out as a change
    controller.io_mut().load_cell.steady = Ok(raw_for_kg(22.0));
    let report = block_on(controller.tick(35_000));
    assert_eq!(report.level.unwrap().percentage, 50.0);
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Change);
    assert!(controller.io().transport.published[2]
        .1
        .contains("\"sensor_fault\":false"));
}

#[test]
fn test_sensor_fault_reissues_stale_reading() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    block_on(controller.tick(0));

    controller.io_mut().load_cell.steady = Err(SensorError::Timeout);
    let report = block_on(controller.tick(30_000));
    let reading = report.reading.unwrap();
    assert!(reading.stale);
    assert_eq!(reading.timestamp_ms, 0);
    assert_eq!(report.sensor_error, Some(SensorError::Timeout));
    assert!(controller.io().transport.published[1]
        .1
        .contains("\"stale\":true"));
}

#[test]
fn test_short_press_runs_span_calibration() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    block_on(controller.tick(0));

    // 15 kg reference reads 30000 counts: 2000 counts per kg
    controller.io_mut().load_cell.steady = Ok(30_000);
    assert!(controller.handle_button(ButtonEvent::ShortPress));
    let report = block_on(controller.tick(1_000));

    let calibration = report.calibration.unwrap();
    assert_eq!(calibration.kind, CalibrationKind::Span);
    let profile = calibration.result.unwrap();
    assert_eq!(profile.calibration_factor, 2000.0);
    assert_eq!(controller.profile().calibration_factor, 2000.0);
    assert_eq!(controller.io().store.saved.len(), 1);
    assert!(controller.io().indicator.patterns.contains(&LedPattern::Solid));
    assert_eq!(report.state, DeviceState::Running);

    // Filter restarted on the new scale: 15 kg is an empty cylinder
    let level = report.level.unwrap();
    assert_eq!(level.percentage, 0.0);
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::Change);
}

#[test]
fn test_long_press_tares() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);

    controller.io_mut().load_cell.steady = Ok(-1_250);
    controller.handle_button(ButtonEvent::LongPress);
    let report = block_on(controller.tick(0));

    let calibration = report.calibration.unwrap();
    assert_eq!(calibration.kind, CalibrationKind::Tare);
    assert_eq!(calibration.result.unwrap().tare_offset, -1_250);
    assert_eq!(controller.profile().calibration_factor, 100.0);
}

#[test]
fn test_calibration_store_failure_keeps_new_profile() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().store.fail = true;
    controller.io_mut().load_cell.steady = Ok(30_000);

    controller.handle_button(ButtonEvent::ShortPress);
    let report = block_on(controller.tick(0));
    assert_eq!(
        report.calibration.unwrap().result,
        Err(CalibrationError::Store(StoreError::Write))
    );
    assert_eq!(controller.profile().calibration_factor, 2000.0);
}

#[test]
fn test_calibration_sensor_failure_keeps_profile() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().load_cell.steady = Err(SensorError::Disconnected);

    controller.handle_button(ButtonEvent::ShortPress);
    let report = block_on(controller.tick(0));
    assert_eq!(
        report.calibration.unwrap().result,
        Err(CalibrationError::Sensor(SensorError::Disconnected))
    );
    assert_eq!(controller.profile().calibration_factor, 100.0);
    assert!(controller.io().store.saved.is_empty());
}

#[test]
fn test_low_battery_reported_and_interval_stretched() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().battery.raw = Ok(0);

    let report = block_on(controller.tick(0));
    assert_eq!(report.power_event, Some(PowerEvent::LowBattery));
    assert_eq!(report.transmission.unwrap().reason, TransmitReason::LowBattery);
    assert!(controller.power_state().low_battery);
    assert!(controller.io().transport.published[0]
        .1
        .contains("\"low_battery\":true"));
    assert_eq!(report.led, LedPattern::SlowBlink);

    let report = block_on(controller.tick(5_000));
    assert!(!report.sampled());
    let report = block_on(controller.tick(20_000));
    assert!(report.sampled());
}

#[test]
fn test_battery_fault_keeps_previous_state() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 22.0);
    controller.io_mut().battery.raw = Err(SensorError::ConversionError);

    let report = block_on(controller.tick(0));
    assert_eq!(report.battery_error, Some(SensorError::ConversionError));
    assert!(report.power.is_none());
    assert_eq!(controller.power_state().battery_percent, 100.0);
}

#[test]
fn test_deep_sleep_cycle() {
    let mut config = MonitorConfig::default();
    config.power.enable_deep_sleep = true;
    let mut controller = booted(&config, 22.0);

    let report = block_on(controller.tick(0));
    assert!(report.transmission.is_some());
    assert_eq!(report.sleep_ms, Some(30_000));
    assert_eq!(report.state, DeviceState::Sleeping);
    assert_eq!(report.led, LedPattern::Off);

    let report = block_on(controller.tick(10_000));
    assert!(!report.sampled());
    assert_eq!(report.state, DeviceState::Sleeping);

    // Button presses wait until the device is awake
    controller.handle_button(ButtonEvent::LongPress);
    let report = block_on(controller.tick(20_000));
    assert!(report.calibration.is_none());

    controller.wake();
    assert_eq!(controller.state(), DeviceState::Running);
    let report = block_on(controller.tick(30_000));
    assert!(report.calibration.is_some());
    assert!(report.sampled());
}

#[test]
fn test_sleeping_shows_critical_level() {
    let mut config = MonitorConfig::default();
    config.power.enable_deep_sleep = true;
    let mut controller = booted(&config, 15.5);

    let report = block_on(controller.tick(0));
    assert_eq!(report.state, DeviceState::Sleeping);
    assert_eq!(report.led, LedPattern::FastBlink);
}

#[test]
fn test_critical_level_led() {
    let config = MonitorConfig::default();
    let mut controller = booted(&config, 15.5);
    let report = block_on(controller.tick(0));
    assert_eq!(report.level.unwrap().status, LevelStatus::Critical);
    assert_eq!(report.led, LedPattern::FastBlink);
}
