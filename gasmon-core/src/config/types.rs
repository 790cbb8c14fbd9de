//! Configuration type definitions
//!
//! These types represent the device configuration: identity, network
//! credentials handed to the network co-processor, calibration defaults,
//! timing, thresholds, power model and safety limits.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum device identifier length
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// Maximum firmware/hardware version string length
pub const MAX_VERSION_LEN: usize = 16;

/// Maximum SSID length (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum length for passwords, hostnames and user names
pub const MAX_CREDENTIAL_LEN: usize = 64;

/// Largest supported smoothing window
pub const MAX_FILTER_WINDOW: usize = 16;

/// Largest number of raw samples averaged during calibration
pub const MAX_CALIBRATION_SAMPLES: u8 = 64;

/// Errors found while validating a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Device identifier is empty or contains characters unusable in a topic
    InvalidDeviceId,
    /// Cylinder weights violate `full > empty > 0`
    InvalidCylinderWeights,
    /// Calibration factor is zero or not finite
    InvalidCalibrationFactor,
    /// Reference weight is not positive, or the sample count is out of range
    InvalidCalibrationProcedure,
    /// A timing interval is zero
    InvalidInterval,
    /// Thresholds violate `0 <= critical < low <= 100` or change is not positive
    InvalidThresholds,
    /// Filter window outside `1..=MAX_FILTER_WINDOW`
    InvalidFilterWindow,
    /// Battery voltage model is inconsistent
    InvalidBatteryModel,
    /// Maximum transmission failures must be at least one
    InvalidFailureLimit,
    /// A text field does not fit its fixed capacity
    ValueTooLong,
}

/// Device identity
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    /// Unique device identifier, used in MQTT topics and payloads
    pub device_id: String<MAX_DEVICE_ID_LEN>,
    /// Firmware version reported in telemetry
    pub firmware_version: String<MAX_VERSION_LEN>,
    /// Hardware revision
    pub hardware_version: String<MAX_VERSION_LEN>,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_id: bounded("easygas_sensor_001"),
            firmware_version: bounded("1.0.0"),
            hardware_version: bounded("1.0"),
        }
    }
}

/// Network credentials forwarded to the network co-processor at boot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    pub wifi_ssid: String<MAX_SSID_LEN>,
    pub wifi_password: String<MAX_CREDENTIAL_LEN>,
    pub mqtt_server: String<MAX_CREDENTIAL_LEN>,
    pub mqtt_port: u16,
    pub mqtt_user: String<MAX_CREDENTIAL_LEN>,
    pub mqtt_password: String<MAX_CREDENTIAL_LEN>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: bounded("YourWiFiNetwork"),
            wifi_password: bounded("YourWiFiPassword"),
            mqtt_server: bounded("mqtt.easygas.com"),
            mqtt_port: 1883,
            mqtt_user: bounded("device_user"),
            mqtt_password: bounded("device_password"),
        }
    }
}

/// Load cell calibration defaults and the calibration procedure
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Raw counts per kilogram (sign follows the load cell wiring)
    pub calibration_factor: f32,
    /// Raw counts of the empty platform
    pub tare_offset: i32,
    /// Weight of an empty cylinder (kg)
    pub empty_weight_kg: f32,
    /// Weight of a full cylinder (kg)
    pub full_weight_kg: f32,
    /// Known weight placed on the platform when the button is pressed (kg)
    pub reference_weight_kg: f32,
    /// Raw samples averaged by the calibration and tare routines
    pub samples: u8,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            calibration_factor: -7050.0,
            tare_offset: 0,
            empty_weight_kg: 15.0,
            full_weight_kg: 29.0,
            reference_weight_kg: 15.0,
            samples: 10,
        }
    }
}

/// Scheduler timing (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// How often the load cell is sampled
    pub sensor_read_interval_ms: u32,
    /// How often telemetry is sent without a level change
    pub data_transmission_interval_ms: u32,
    /// How often a liveness heartbeat is sent
    pub heartbeat_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sensor_read_interval_ms: 5_000,
            data_transmission_interval_ms: 30_000,
            heartbeat_interval_ms: 300_000,
        }
    }
}

/// Gas level thresholds (percent)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdConfig {
    /// At or below this level the cylinder is reported as low
    pub low_gas_percent: f32,
    /// At or below this level the cylinder is reported as critical
    pub critical_gas_percent: f32,
    /// Minimum change that triggers an out-of-cycle transmission
    pub change_percent: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            low_gas_percent: 15.0,
            critical_gas_percent: 5.0,
            change_percent: 2.0,
        }
    }
}

/// Smoothing filter applied to weight readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterKind {
    /// Median of the last N readings (rejects single-sample spikes)
    #[default]
    Median,
    /// Arithmetic mean of the last N readings
    MovingAverage,
}

/// Filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterConfig {
    pub kind: FilterKind,
    /// Number of readings in the window (1..=16)
    pub window: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::Median,
            window: 5,
        }
    }
}

/// Battery monitoring and sleep configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerConfig {
    /// Enter sleep between transmission cycles
    pub enable_deep_sleep: bool,
    /// Sleep duration in seconds
    pub sleep_duration_s: u32,
    /// Below this percentage the device is in low-battery mode
    pub low_battery_percent: f32,
    /// Read interval multiplier while in low-battery mode
    pub low_battery_interval_factor: u8,
    /// ADC reference voltage (mV)
    pub adc_vref_mv: u16,
    /// Full-scale ADC count
    pub adc_max: u16,
    /// Battery voltage divider ratio (battery mV / pin mV)
    pub divider_ratio: f32,
    /// Battery voltage considered empty (mV)
    pub battery_empty_mv: u16,
    /// Battery voltage considered full (mV)
    pub battery_full_mv: u16,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            enable_deep_sleep: false,
            sleep_duration_s: 30,
            low_battery_percent: 20.0,
            low_battery_interval_factor: 4,
            adc_vref_mv: 3300,
            adc_max: 4095,
            divider_ratio: 2.0,
            battery_empty_mv: 3300,
            battery_full_mv: 4200,
        }
    }
}

/// Safety limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyConfig {
    /// Consecutive failed sends before a restart is requested
    pub max_transmission_failures: u8,
    /// Hardware watchdog timeout (ms)
    pub watchdog_timeout_ms: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_transmission_failures: 5,
            watchdog_timeout_ms: 60_000,
        }
    }
}

/// Complete device configuration
///
/// Constructed once at startup and passed by reference to each component.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    pub device: DeviceInfo,
    pub network: NetworkConfig,
    pub calibration: CalibrationConfig,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
    pub filter: FilterConfig,
    pub power: PowerConfig,
    pub safety: SafetyConfig,
}

impl MonitorConfig {
    /// Check every invariant the components rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let id = self.device.device_id.as_str();
        if id.is_empty() || id.contains(['/', '+', '#']) || id.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidDeviceId);
        }

        let cal = &self.calibration;
        if !(cal.empty_weight_kg > 0.0 && cal.full_weight_kg > cal.empty_weight_kg)
            || !cal.full_weight_kg.is_finite()
        {
            return Err(ConfigError::InvalidCylinderWeights);
        }
        if !cal.calibration_factor.is_finite() || cal.calibration_factor == 0.0 {
            return Err(ConfigError::InvalidCalibrationFactor);
        }
        if !(cal.reference_weight_kg > 0.0 && cal.reference_weight_kg.is_finite())
            || cal.samples == 0
            || cal.samples > MAX_CALIBRATION_SAMPLES
        {
            return Err(ConfigError::InvalidCalibrationProcedure);
        }

        let timing = &self.timing;
        if timing.sensor_read_interval_ms == 0
            || timing.data_transmission_interval_ms == 0
            || timing.heartbeat_interval_ms == 0
            || self.safety.watchdog_timeout_ms == 0
        {
            return Err(ConfigError::InvalidInterval);
        }

        let th = &self.thresholds;
        if !(th.critical_gas_percent >= 0.0
            && th.critical_gas_percent < th.low_gas_percent
            && th.low_gas_percent <= 100.0
            && th.change_percent > 0.0)
        {
            return Err(ConfigError::InvalidThresholds);
        }

        if self.filter.window == 0 || self.filter.window as usize > MAX_FILTER_WINDOW {
            return Err(ConfigError::InvalidFilterWindow);
        }

        let power = &self.power;
        if power.adc_max == 0
            || power.adc_vref_mv == 0
            || !(power.divider_ratio > 0.0 && power.divider_ratio.is_finite())
            || power.battery_full_mv <= power.battery_empty_mv
            || power.low_battery_interval_factor == 0
            || !(0.0..=100.0).contains(&power.low_battery_percent)
            || (power.enable_deep_sleep && power.sleep_duration_s == 0)
        {
            return Err(ConfigError::InvalidBatteryModel);
        }

        if self.safety.max_transmission_failures == 0 {
            return Err(ConfigError::InvalidFailureLimit);
        }

        Ok(())
    }
}

/// Build a bounded string from a literal known to fit
fn bounded<const N: usize>(value: &str) -> String<N> {
    let mut s = String::new();
    for c in value.chars() {
        if s.push(c).is_err() {
            break;
        }
    }
    s
}
