//! Calibration persistence
//!
//! Loads and saves the load cell calibration record in flash. The record
//! carries a magic, a version and a CRC; anything that fails those checks
//! is ignored in favour of the compiled-in calibration.

use defmt::*;

use gasmon_core::config::{CalibrationProfile, CalibrationRecord};
use gasmon_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use gasmon_hal_rp2040::FlashStorageTrait;

/// Maximum serialized record size
const MAX_RECORD_SIZE: usize = 64;

/// Calibration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic or version
    InvalidFormat,
    /// Record decodes but yields an unusable profile
    InvalidProfile,
}

impl From<FlashError> for PersistError {
    fn from(e: FlashError) -> Self {
        PersistError::Flash(e)
    }
}

/// Load the persisted calibration on top of `base`
///
/// Returns `base` unchanged if nothing usable is stored.
pub async fn load_calibration(
    storage: &mut FlashStorage<'_>,
    base: CalibrationProfile,
) -> CalibrationProfile {
    match load_inner(storage, base).await {
        Ok(profile) => {
            info!(
                "Loaded calibration from flash: factor={}, tare={}",
                profile.calibration_factor, profile.tare_offset
            );
            profile
        }
        Err(PersistError::Flash(FlashError::NotFound)) => {
            debug!("No calibration in flash, using compiled-in values");
            base
        }
        Err(e) => {
            warn!("Failed to load calibration: {:?}, using compiled-in values", e);
            base
        }
    }
}

async fn load_inner(
    storage: &mut FlashStorage<'_>,
    base: CalibrationProfile,
) -> Result<CalibrationProfile, PersistError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::Calibration, &mut buffer).await?;

    debug!("Read {} bytes of calibration from flash", len);

    let record: CalibrationRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| PersistError::Deserialize)?;

    if !record.is_valid() {
        return Err(PersistError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(PersistError::CrcMismatch);
    }

    let profile = base.with_record(&record);
    if !profile.is_valid() {
        return Err(PersistError::InvalidProfile);
    }
    Ok(profile)
}

/// Persist a calibration profile
pub async fn save_calibration(
    storage: &mut FlashStorage<'_>,
    profile: &CalibrationProfile,
) -> Result<(), PersistError> {
    let record = profile.to_record();

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes = postcard::to_slice(&record, &mut buffer).map_err(|_| PersistError::Serialize)?;

    debug!("Saving {} bytes of calibration to flash", bytes.len());

    storage.write(StorageKey::Calibration, bytes).await?;

    info!(
        "Saved calibration: factor={}, tare={}",
        record.calibration_factor, record.tare_offset
    );
    Ok(())
}
