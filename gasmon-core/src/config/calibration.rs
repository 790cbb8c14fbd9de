//! Load cell calibration types
//!
//! The active `CalibrationProfile` starts from the configured defaults and is
//! overridden by a `CalibrationRecord` persisted in flash, if one is valid.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::CalibrationConfig;

/// Magic number to identify a valid calibration record
pub const CALIBRATION_MAGIC: u32 = 0x4743_414C; // "GCAL"

/// Current calibration record version
pub const CALIBRATION_VERSION: u8 = 1;

/// Calibration currently applied to raw load cell readings
///
/// Weight is derived as `(raw - tare_offset) / calibration_factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationProfile {
    /// Raw counts per kilogram
    pub calibration_factor: f32,
    /// Raw counts of the empty platform
    pub tare_offset: i32,
    /// Weight of an empty cylinder (kg)
    pub empty_weight_kg: f32,
    /// Weight of a full cylinder (kg)
    pub full_weight_kg: f32,
}

impl CalibrationProfile {
    /// Build the profile from configured defaults
    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self {
            calibration_factor: config.calibration_factor,
            tare_offset: config.tare_offset,
            empty_weight_kg: config.empty_weight_kg,
            full_weight_kg: config.full_weight_kg,
        }
    }

    /// Apply a persisted record, keeping the cylinder weights
    pub fn with_record(self, record: &CalibrationRecord) -> Self {
        Self {
            calibration_factor: record.calibration_factor,
            tare_offset: record.tare_offset,
            ..self
        }
    }

    /// Convert a raw reading to kilograms
    pub fn raw_to_kg(&self, raw: i32) -> f32 {
        let counts = raw as i64 - self.tare_offset as i64;
        counts as f32 / self.calibration_factor
    }

    /// Check the profile invariants
    pub fn is_valid(&self) -> bool {
        self.calibration_factor.is_finite()
            && self.calibration_factor != 0.0
            && self.empty_weight_kg > 0.0
            && self.full_weight_kg > self.empty_weight_kg
            && self.full_weight_kg.is_finite()
    }

    /// Profile after a span calibration with a known reference weight
    ///
    /// `average_raw` is the mean raw reading with the reference on the
    /// platform. Returns `None` if the resulting factor would be unusable.
    pub fn calibrated(&self, average_raw: f32, reference_weight_kg: f32) -> Option<Self> {
        if !(reference_weight_kg > 0.0) {
            return None;
        }
        let factor = (average_raw - self.tare_offset as f32) / reference_weight_kg;
        let next = Self {
            calibration_factor: factor,
            ..*self
        };
        next.is_valid().then_some(next)
    }

    /// Profile after taring the empty platform
    pub fn tared(&self, average_raw: f32) -> Option<Self> {
        if !average_raw.is_finite()
            || average_raw < i32::MIN as f32
            || average_raw > i32::MAX as f32
        {
            return None;
        }
        Some(Self {
            tare_offset: libm::roundf(average_raw) as i32,
            ..*self
        })
    }

    /// Persistable form of this profile
    pub fn to_record(&self) -> CalibrationRecord {
        let mut record = CalibrationRecord {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            calibration_factor: self.calibration_factor,
            tare_offset: self.tare_offset,
            crc: 0,
        };
        record.update_crc();
        record
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::from_config(&CalibrationConfig::default())
    }
}

/// Calibration record stored in flash
///
/// Serialized with postcard; the CRC covers every field before it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Record format version
    pub version: u8,
    /// Raw counts per kilogram
    pub calibration_factor: f32,
    /// Raw counts of the empty platform
    pub tare_offset: i32,
    /// CRC32 checksum (calculated over magic..tare_offset)
    pub crc: u32,
}

impl CalibrationRecord {
    /// Check if the header matches this firmware's format
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Calculate CRC32 for the record (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.calibration_factor.to_le_bytes());
        crc = crc32_update(crc, &self.tare_offset.to_le_bytes());
        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CalibrationProfile {
        CalibrationProfile {
            calibration_factor: 1000.0,
            tare_offset: 50_000,
            empty_weight_kg: 15.0,
            full_weight_kg: 29.0,
        }
    }

    #[test]
    fn test_raw_to_kg_subtracts_tare() {
        let p = profile();
        assert_eq!(p.raw_to_kg(50_000), 0.0);
        assert_eq!(p.raw_to_kg(70_000), 20.0);
    }

    #[test]
    fn test_negative_factor_flips_sign() {
        let p = CalibrationProfile {
            calibration_factor: -7050.0,
            tare_offset: 0,
            ..profile()
        };
        let kg = p.raw_to_kg(-7050 * 20);
        assert!(libm::fabsf(kg - 20.0) < 1e-3);
    }

    #[test]
    fn test_calibrated_computes_factor_from_reference() {
        let p = profile().calibrated(65_000.0, 15.0).unwrap();
        assert_eq!(p.calibration_factor, 1000.0);
        assert_eq!(p.tare_offset, 50_000);
    }

    #[test]
    fn test_calibrated_rejects_zero_span() {
        assert!(profile().calibrated(50_000.0, 15.0).is_none());
        assert!(profile().calibrated(65_000.0, 0.0).is_none());
    }

    #[test]
    fn test_tared_rounds_average() {
        let p = profile().tared(1234.6).unwrap();
        assert_eq!(p.tare_offset, 1235);
        assert_eq!(p.calibration_factor, 1000.0);
        assert!(profile().tared(f32::NAN).is_none());
    }

    #[test]
    fn test_record_roundtrip_through_profile() {
        let record = profile().to_record();
        assert!(record.is_valid());
        assert!(record.verify_crc());

        let restored = CalibrationProfile::default().with_record(&record);
        assert_eq!(restored.calibration_factor, 1000.0);
        assert_eq!(restored.tare_offset, 50_000);
        assert_eq!(restored.empty_weight_kg, 15.0);
    }

    #[test]
    fn test_corrupted_record_fails_crc() {
        let mut record = profile().to_record();
        record.tare_offset += 1;
        assert!(!record.verify_crc());
    }

    #[test]
    fn test_wrong_magic_is_invalid() {
        let mut record = profile().to_record();
        record.magic = 0x5049_4443;
        assert!(!record.is_valid());
    }

    #[test]
    fn test_crc32_reference_value() {
        // IEEE CRC32 of "123456789"
        assert_eq!(!crc32_update(0xFFFF_FFFF, b"123456789"), 0xCBF4_3926);
    }
}
