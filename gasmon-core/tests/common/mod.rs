//! In-memory collaborators for controller tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use gasmon_core::config::{CalibrationProfile, MonitorConfig};
use gasmon_core::controller::{DeviceController, DeviceIo};
use gasmon_core::traits::{
    BatteryAdc, CalibrationStore, LedPattern, LoadCell, SensorError, StatusIndicator, StoreError,
    Transport, Watchdog,
};

/// Load cell returning scripted results, then a steady value
pub struct FakeLoadCell {
    pub script: VecDeque<Result<i32, SensorError>>,
    pub steady: Result<i32, SensorError>,
    pub reads: u32,
}

impl FakeLoadCell {
    pub fn steady(raw: i32) -> Self {
        Self {
            script: VecDeque::new(),
            steady: Ok(raw),
            reads: 0,
        }
    }
}

impl LoadCell for FakeLoadCell {
    fn read_raw(&mut self) -> Result<i32, SensorError> {
        self.reads += 1;
        self.script.pop_front().unwrap_or(self.steady)
    }
}

pub struct FakeBattery {
    pub raw: Result<u16, SensorError>,
}

impl BatteryAdc for FakeBattery {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.raw
    }
}

/// Records every publish; succeeds while `online`
pub struct FakeTransport {
    pub online: bool,
    pub published: Vec<(String, String)>,
}

impl Transport for FakeTransport {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.published.push((
            String::from(topic),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        self.online
    }
}

pub struct FakeStore {
    pub fail: bool,
    pub saved: Vec<CalibrationProfile>,
}

impl CalibrationStore for FakeStore {
    async fn save(&mut self, profile: &CalibrationProfile) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Write);
        }
        self.saved.push(*profile);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIndicator {
    pub patterns: Vec<LedPattern>,
}

impl StatusIndicator for FakeIndicator {
    fn set_pattern(&mut self, pattern: LedPattern) {
        self.patterns.push(pattern);
    }
}

#[derive(Default)]
pub struct FakeWatchdog {
    pub feeds: u32,
}

impl Watchdog for FakeWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

pub type TestController<'c> = DeviceController<
    'c,
    FakeLoadCell,
    FakeBattery,
    FakeTransport,
    FakeStore,
    FakeIndicator,
    FakeWatchdog,
>;

/// Battery ADC count for a full battery under the default divider model
pub const FULL_BATTERY_RAW: u16 = 2700;

/// 100 raw counts per kg, no tare, 15 kg empty / 29 kg full
pub fn test_profile() -> CalibrationProfile {
    CalibrationProfile {
        calibration_factor: 100.0,
        tare_offset: 0,
        empty_weight_kg: 15.0,
        full_weight_kg: 29.0,
    }
}

/// Raw count for a weight under `test_profile`
pub fn raw_for_kg(kg: f32) -> i32 {
    (kg * 100.0) as i32
}

pub fn io(raw: i32) -> DeviceIo<
    FakeLoadCell,
    FakeBattery,
    FakeTransport,
    FakeStore,
    FakeIndicator,
    FakeWatchdog,
> {
    DeviceIo {
        load_cell: FakeLoadCell::steady(raw),
        battery: FakeBattery {
            raw: Ok(FULL_BATTERY_RAW),
        },
        transport: FakeTransport {
            online: true,
            published: Vec::new(),
        },
        store: FakeStore {
            fail: false,
            saved: Vec::new(),
        },
        indicator: FakeIndicator::default(),
        watchdog: FakeWatchdog::default(),
    }
}

/// Booted controller with the cylinder at `kg`
pub fn booted(config: &MonitorConfig, kg: f32) -> TestController<'_> {
    let mut controller = DeviceController::new(config, io(raw_for_kg(kg)), test_profile());
    controller.boot();
    controller
}
