//! Battery supervision and sleep gating

use crate::config::PowerConfig;

/// Percentage above the low threshold needed to leave low-battery mode
pub const LOW_BATTERY_HYSTERESIS_PERCENT: f32 = 2.0;

/// Power status
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerState {
    /// Estimated remaining charge, clamped to 0..=100
    pub battery_percent: f32,
    pub sleeping: bool,
    /// Below the low-battery threshold (with hysteresis)
    pub low_battery: bool,
}

impl Default for PowerState {
    fn default() -> Self {
        Self {
            battery_percent: 100.0,
            sleeping: false,
            low_battery: false,
        }
    }
}

/// Battery threshold crossings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerEvent {
    /// Battery fell below the low threshold
    LowBattery,
    /// Battery rose back above threshold plus hysteresis
    Recovered,
}

/// Tracks battery level and decides sleep cycling
#[derive(Debug, Clone)]
pub struct PowerSupervisor {
    config: PowerConfig,
    state: PowerState,
    millivolts: u32,
    event: Option<PowerEvent>,
}

impl PowerSupervisor {
    pub fn new(config: &PowerConfig) -> Self {
        Self {
            config: *config,
            state: PowerState::default(),
            millivolts: config.battery_full_mv as u32,
            event: None,
        }
    }

    /// Update from a raw battery ADC reading
    pub fn monitor(&mut self, battery_raw: u16) -> PowerState {
        self.millivolts = self.raw_to_millivolts(battery_raw);
        self.state.battery_percent = self.millivolts_to_percent(self.millivolts);

        let threshold = self.config.low_battery_percent;
        if !self.state.low_battery && self.state.battery_percent < threshold {
            self.state.low_battery = true;
            self.event = Some(PowerEvent::LowBattery);
        } else if self.state.low_battery
            && self.state.battery_percent > threshold + LOW_BATTERY_HYSTERESIS_PERCENT
        {
            self.state.low_battery = false;
            self.event = Some(PowerEvent::Recovered);
        }

        self.state
    }

    /// Battery voltage for a raw count: `raw * vref * divider / adc_max`
    pub fn raw_to_millivolts(&self, raw: u16) -> u32 {
        let pin_mv = raw as f32 * self.config.adc_vref_mv as f32 / self.config.adc_max as f32;
        let mv = pin_mv * self.config.divider_ratio;
        if mv > 0.0 {
            libm::roundf(mv) as u32
        } else {
            0
        }
    }

    fn millivolts_to_percent(&self, mv: u32) -> f32 {
        let empty = self.config.battery_empty_mv as f32;
        let full = self.config.battery_full_mv as f32;
        let percent = (mv as f32 - empty) * 100.0 / (full - empty);
        percent.clamp(0.0, 100.0)
    }

    /// Take the threshold crossing produced by the last `monitor` call
    pub fn take_event(&mut self) -> Option<PowerEvent> {
        self.event.take()
    }

    /// Sleep is allowed only when enabled and currently awake
    pub fn should_sleep(&self) -> bool {
        self.config.enable_deep_sleep && !self.state.sleeping
    }

    /// Mark the device as sleeping and return the sleep duration (ms)
    pub fn enter_sleep(&mut self) -> u32 {
        self.state.sleeping = true;
        self.config.sleep_duration_s.saturating_mul(1000)
    }

    pub fn wake(&mut self) {
        self.state.sleeping = false;
    }

    /// Sensor read interval adjusted for low-battery mode
    pub fn read_interval_ms(&self, base_ms: u32) -> u64 {
        if self.state.low_battery {
            base_ms as u64 * self.config.low_battery_interval_factor as u64
        } else {
            base_ms as u64
        }
    }

    pub fn state(&self) -> &PowerState {
        &self.state
    }

    /// Last computed battery voltage (mV)
    pub fn millivolts(&self) -> u32 {
        self.millivolts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> PowerSupervisor {
        PowerSupervisor::new(&PowerConfig::default())
    }

    /// Raw count for a battery voltage under the default divider model
    fn raw_for(mv: u32) -> u16 {
        // mv = raw * 3300 * 2 / 4095
        ((mv as u64 * 4095 + 3300) / 6600) as u16
    }

    #[test]
    fn test_starts_full_and_awake() {
        let s = supervisor();
        assert_eq!(s.state().battery_percent, 100.0);
        assert!(!s.state().sleeping);
        assert!(!s.state().low_battery);
    }

    #[test]
    fn test_raw_to_millivolts() {
        let s = supervisor();
        assert_eq!(s.raw_to_millivolts(0), 0);
        assert_eq!(s.raw_to_millivolts(4095), 6600);
        assert_eq!(s.raw_to_millivolts(2048), 3301);
    }

    #[test]
    fn test_percent_is_clamped() {
        let mut s = supervisor();
        assert_eq!(s.monitor(4095).battery_percent, 100.0);
        assert_eq!(s.monitor(0).battery_percent, 0.0);
    }

    #[test]
    fn test_percent_between_empty_and_full() {
        let mut s = supervisor();
        let state = s.monitor(raw_for(3750));
        assert!(libm::fabsf(state.battery_percent - 50.0) < 1.0);
    }

    #[test]
    fn test_low_battery_event_once_with_hysteresis() {
        let mut s = supervisor();
        // 3450 mV is about 16.7 %
        s.monitor(raw_for(3450));
        assert!(s.state().low_battery);
        assert_eq!(s.take_event(), Some(PowerEvent::LowBattery));

        s.monitor(raw_for(3440));
        assert_eq!(s.take_event(), None);

        // About 21 %: above threshold but inside hysteresis
        s.monitor(raw_for(3490));
        assert!(s.state().low_battery);
        assert_eq!(s.take_event(), None);

        // About 27 %
        s.monitor(raw_for(3545));
        assert!(!s.state().low_battery);
        assert_eq!(s.take_event(), Some(PowerEvent::Recovered));
    }

    #[test]
    fn test_low_battery_stretches_read_interval() {
        let mut s = supervisor();
        assert_eq!(s.read_interval_ms(5_000), 5_000);
        s.monitor(0);
        assert_eq!(s.read_interval_ms(5_000), 20_000);
    }

    #[test]
    fn test_sleep_gating() {
        let mut s = supervisor();
        assert!(!s.should_sleep());

        let mut s = PowerSupervisor::new(&PowerConfig {
            enable_deep_sleep: true,
            ..PowerConfig::default()
        });
        assert!(s.should_sleep());
        assert_eq!(s.enter_sleep(), 30_000);
        assert!(s.state().sleeping);
        assert!(!s.should_sleep());
        s.wake();
        assert!(s.should_sleep());
    }
}
