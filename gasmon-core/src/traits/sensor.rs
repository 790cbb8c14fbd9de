//! Load cell and battery sensing traits

/// Errors that can occur while reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor not responding (data line stuck or unplugged)
    Disconnected,
    /// Reading pinned at the converter's full-scale limit
    Saturated,
    /// Conversion did not complete in time
    Timeout,
    /// ADC conversion error
    ConversionError,
}

/// Trait for load cell amplifiers
///
/// Implementations return the signed raw conversion result. Calibration
/// is applied by the sampler, not the driver.
pub trait LoadCell {
    /// Read one raw conversion
    ///
    /// Takes `&mut self` because the read clocks the converter.
    fn read_raw(&mut self) -> Result<i32, SensorError>;
}

/// Trait for the battery voltage ADC channel
pub trait BatteryAdc {
    /// Read the raw ADC count at the divider output
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}
