//! Calibrated weight sampler

use super::filter::SmoothingFilter;
use crate::config::{CalibrationProfile, FilterConfig};
use crate::traits::{LoadCell, SensorError};

/// One weight sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Raw conversion result the reading was derived from
    pub raw_value: i32,
    /// Calibrated, filtered weight (kg)
    pub filtered_weight_kg: f32,
    /// Time the raw value was taken (ms since boot)
    pub timestamp_ms: u64,
    /// True when this is the last good reading re-issued after a fault
    pub stale: bool,
}

/// Reads the load cell and produces filtered weight readings
///
/// On a driver fault the last known-good reading is returned with `stale`
/// set, keeping its original timestamp.
#[derive(Debug, Clone)]
pub struct WeightSampler {
    filter: SmoothingFilter,
    last_sample_ms: Option<u64>,
    last_good: Option<SensorReading>,
    last_error: Option<SensorError>,
    fault_count: u32,
}

impl WeightSampler {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filter: SmoothingFilter::new(config),
            last_sample_ms: None,
            last_good: None,
            last_error: None,
            fault_count: 0,
        }
    }

    /// Check whether a sample is due at `now_ms`
    pub fn is_due(&self, now_ms: u64, interval_ms: u64) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        }
    }

    /// Take one sample
    ///
    /// Returns an error only if the driver faulted and no good reading has
    /// ever been taken.
    pub fn sample<L: LoadCell>(
        &mut self,
        driver: &mut L,
        profile: &CalibrationProfile,
        now_ms: u64,
    ) -> Result<SensorReading, SensorError> {
        self.last_sample_ms = Some(now_ms);

        match driver.read_raw() {
            Ok(raw) => {
                let weight = profile.raw_to_kg(raw);
                if !weight.is_finite() {
                    return self.fault(SensorError::ConversionError);
                }
                let reading = SensorReading {
                    raw_value: raw,
                    filtered_weight_kg: self.filter.push(weight),
                    timestamp_ms: now_ms,
                    stale: false,
                };
                self.last_good = Some(reading);
                self.last_error = None;
                Ok(reading)
            }
            Err(e) => self.fault(e),
        }
    }

    fn fault(&mut self, error: SensorError) -> Result<SensorReading, SensorError> {
        self.fault_count = self.fault_count.saturating_add(1);
        self.last_error = Some(error);
        match self.last_good {
            Some(good) => Ok(SensorReading {
                stale: true,
                ..good
            }),
            None => Err(error),
        }
    }

    /// Most recent reading that was not stale
    pub fn last_good(&self) -> Option<&SensorReading> {
        self.last_good.as_ref()
    }

    /// Error from the most recent sample, if it faulted
    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }

    /// Total driver faults since boot
    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    /// Drop filter history and the last good reading
    ///
    /// Used after recalibration so old-scale readings are not mixed in.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_good = None;
        self.last_error = None;
        self.last_sample_ms = None;
    }
}
