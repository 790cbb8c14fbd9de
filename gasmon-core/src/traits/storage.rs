//! Calibration persistence trait

use crate::config::CalibrationProfile;

/// Errors reported by a calibration store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Record could not be serialized
    Serialize,
    /// Underlying storage failed the write
    Write,
    /// Storage is busy or unavailable
    Unavailable,
}

/// Persistent storage for the active calibration
#[allow(async_fn_in_trait)]
pub trait CalibrationStore {
    /// Persist a calibration profile so it survives a restart
    async fn save(&mut self, profile: &CalibrationProfile) -> Result<(), StoreError>;
}
