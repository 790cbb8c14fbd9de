//! Device configuration
//!
//! `device.toml` is validated and turned into Rust by the build script;
//! this module hosts the generated code and the calibration persistence.

pub mod calibration;

use defmt::*;
use heapless::String;

use gasmon_core::config::{
    CalibrationConfig, ConfigError, DeviceInfo, FilterConfig, FilterKind, MonitorConfig,
    NetworkConfig, PowerConfig, SafetyConfig, ThresholdConfig, TimingConfig,
};

include!(concat!(env!("OUT_DIR"), "/device_config.rs"));

/// GPIO numbers for the general-purpose wiring
pub struct PinAssignment {
    pub hx711_sck: u8,
    pub hx711_dout: u8,
    pub led: u8,
    /// LED on = pin LOW
    pub led_inverted: bool,
    pub button: u8,
    /// Pressed = pin LOW (button to ground with pull-up)
    pub button_active_low: bool,
}

fn text<const N: usize>(value: &str) -> Result<String<N>, ConfigError> {
    String::try_from(value).map_err(|_| ConfigError::ValueTooLong)
}

/// Build and validate the compiled-in configuration
///
/// Falls back to the factory defaults if the generated configuration is
/// rejected, which the build script already makes unlikely.
pub fn load_config() -> MonitorConfig {
    let result = device_config().and_then(|config| config.validate().map(|()| config));
    match result {
        Ok(config) => {
            info!(
                "Device {} (fw {}, hw {})",
                config.device.device_id.as_str(),
                config.device.firmware_version.as_str(),
                config.device.hardware_version.as_str()
            );
            config
        }
        Err(e) => {
            error!("Compiled configuration rejected: {:?}", e);
            warn!("Using factory defaults");
            MonitorConfig::default()
        }
    }
}
