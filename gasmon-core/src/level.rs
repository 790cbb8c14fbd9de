//! Gas level estimation
//!
//! Converts a filtered weight into a fill percentage between the configured
//! empty and full cylinder weights, and classifies it against thresholds.

use crate::config::{CalibrationProfile, ThresholdConfig};
use crate::sampler::SensorReading;

/// Fill level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LevelStatus {
    Normal,
    Low,
    Critical,
}

impl LevelStatus {
    /// Wire name used in telemetry payloads
    pub const fn as_str(&self) -> &'static str {
        match self {
            LevelStatus::Normal => "normal",
            LevelStatus::Low => "low",
            LevelStatus::Critical => "critical",
        }
    }
}

/// Estimated gas level
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasLevel {
    /// Fill percentage, clamped to 0..=100
    pub percentage: f32,
    pub status: LevelStatus,
}

/// Weight to level converter
#[derive(Debug, Clone, Copy)]
pub struct LevelEstimator {
    low_percent: f32,
    critical_percent: f32,
    change_percent: f32,
}

impl LevelEstimator {
    pub fn new(thresholds: &ThresholdConfig) -> Self {
        Self {
            low_percent: thresholds.low_gas_percent,
            critical_percent: thresholds.critical_gas_percent,
            change_percent: thresholds.change_percent,
        }
    }

    /// Estimate the level for a sampled reading
    pub fn estimate(&self, reading: &SensorReading, profile: &CalibrationProfile) -> GasLevel {
        self.estimate_weight(reading.filtered_weight_kg, profile)
    }

    /// Estimate the level for a weight in kilograms
    pub fn estimate_weight(&self, weight_kg: f32, profile: &CalibrationProfile) -> GasLevel {
        let span = profile.full_weight_kg - profile.empty_weight_kg;
        let raw = if span > 0.0 {
            100.0 * (weight_kg - profile.empty_weight_kg) / span
        } else {
            0.0
        };
        // NaN compares false on both sides and lands on 0
        let percentage = if raw >= 100.0 {
            100.0
        } else if raw > 0.0 {
            raw
        } else {
            0.0
        };

        GasLevel {
            percentage,
            status: self.classify(percentage),
        }
    }

    /// Classify a percentage against the thresholds
    pub fn classify(&self, percentage: f32) -> LevelStatus {
        if percentage <= self.critical_percent {
            LevelStatus::Critical
        } else if percentage <= self.low_percent {
            LevelStatus::Low
        } else {
            LevelStatus::Normal
        }
    }

    /// Check whether the level moved by at least the change threshold
    pub fn has_significant_change(&self, previous: &GasLevel, current: &GasLevel) -> bool {
        significant_change(previous.percentage, current.percentage, self.change_percent)
    }

    /// Change threshold in percent
    pub fn change_percent(&self) -> f32 {
        self.change_percent
    }
}

/// `|current - previous| >= threshold`
pub fn significant_change(previous: f32, current: f32, threshold: f32) -> bool {
    libm::fabsf(current - previous) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> LevelEstimator {
        LevelEstimator::new(&ThresholdConfig::default())
    }

    fn profile() -> CalibrationProfile {
        CalibrationProfile {
            calibration_factor: 1.0,
            tare_offset: 0,
            empty_weight_kg: 15.0,
            full_weight_kg: 29.0,
        }
    }

    fn level(percentage: f32) -> GasLevel {
        GasLevel {
            percentage,
            status: estimator().classify(percentage),
        }
    }

    #[test]
    fn test_endpoints() {
        let e = estimator();
        assert_eq!(e.estimate_weight(15.0, &profile()).percentage, 0.0);
        assert_eq!(e.estimate_weight(29.0, &profile()).percentage, 100.0);
        assert_eq!(e.estimate_weight(22.0, &profile()).percentage, 50.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        let e = estimator();
        assert_eq!(e.estimate_weight(3.0, &profile()).percentage, 0.0);
        assert_eq!(e.estimate_weight(-40.0, &profile()).percentage, 0.0);
        assert_eq!(e.estimate_weight(35.0, &profile()).percentage, 100.0);
        assert_eq!(e.estimate_weight(f32::NAN, &profile()).percentage, 0.0);
    }

    #[test]
    fn test_classification_boundaries() {
        let e = estimator();
        assert_eq!(e.classify(4.0), LevelStatus::Critical);
        assert_eq!(e.classify(5.0), LevelStatus::Critical);
        assert_eq!(e.classify(15.0), LevelStatus::Low);
        assert_eq!(e.classify(16.0), LevelStatus::Normal);
        assert_eq!(e.classify(0.0), LevelStatus::Critical);
        assert_eq!(e.classify(100.0), LevelStatus::Normal);
    }

    #[test]
    fn test_significant_change_threshold() {
        let e = estimator();
        assert!(!e.has_significant_change(&level(50.0), &level(51.9)));
        assert!(e.has_significant_change(&level(50.0), &level(52.0)));
        assert!(e.has_significant_change(&level(52.0), &level(50.0)));
    }

    #[test]
    fn test_estimate_uses_filtered_weight() {
        let reading = SensorReading {
            raw_value: 0,
            filtered_weight_kg: 16.4,
            timestamp_ms: 0,
            stale: false,
        };
        let l = estimator().estimate(&reading, &profile());
        assert!(libm::fabsf(l.percentage - 10.0) < 1e-4);
        assert_eq!(l.status, LevelStatus::Low);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(LevelStatus::Normal.as_str(), "normal");
        assert_eq!(LevelStatus::Low.as_str(), "low");
        assert_eq!(LevelStatus::Critical.as_str(), "critical");
    }
}
