//! Battery voltage divider ADC
//!
//! The battery feeds an ADC pin through a resistive divider. Readings are
//! oversampled and averaged; conversion to volts happens in the core.

use gasmon_core::traits::{BatteryAdc, SensorError};

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Oversampled battery divider channel
pub struct DividerAdc<ADC> {
    adc: ADC,
    /// Reads averaged per sample
    oversample: u8,
    /// Full-scale ADC count
    adc_max: u16,
}

impl<ADC> DividerAdc<ADC> {
    /// Create a battery channel
    ///
    /// # Arguments
    /// - `adc`: ADC channel at the divider midpoint
    /// - `oversample`: reads averaged per sample (at least 1)
    /// - `adc_max`: full-scale count (4095 for 12-bit)
    pub fn new(adc: ADC, oversample: u8, adc_max: u16) -> Self {
        Self {
            adc,
            oversample: oversample.max(1),
            adc_max,
        }
    }
}

impl<ADC: AdcReader> BatteryAdc for DividerAdc<ADC> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut sum: u32 = 0;
        for _ in 0..self.oversample {
            sum += self.adc.read().map_err(|_| SensorError::ConversionError)? as u32;
        }
        let average = (sum / self.oversample as u32) as u16;

        // A pinned reading means the divider is open or the input exceeds range
        if average >= self.adc_max {
            return Err(SensorError::Saturated);
        }
        Ok(average)
    }
}

/// Fixed-sequence ADC for testing
#[cfg(test)]
pub struct DummyAdc {
    pub values: [u16; 4],
    pub index: usize,
}

#[cfg(test)]
impl AdcReader for DummyAdc {
    fn read(&mut self) -> Result<u16, ()> {
        let v = self.values[self.index % 4];
        self.index += 1;
        Ok(v)
    }
}
