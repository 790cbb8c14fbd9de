//! Calibration persistence task
//!
//! Owns the flash storage and writes calibration profiles handed over by
//! the controller's store adapter, answering each with the outcome.

use defmt::*;

use gasmon_core::traits::StoreError;
use gasmon_hal_rp2040::flash::FlashStorage;

use crate::channels::{CALIBRATION_SAVE, CALIBRATION_SAVED};
use crate::config::calibration::{save_calibration, PersistError};

#[embassy_executor::task]
pub async fn calibration_task(mut storage: FlashStorage<'static>) {
    info!("Calibration task started");

    loop {
        let profile = CALIBRATION_SAVE.receive().await;

        let result = save_calibration(&mut storage, &profile)
            .await
            .map_err(|e| {
                error!("Failed to save calibration: {:?}", e);
                match e {
                    PersistError::Serialize => StoreError::Serialize,
                    _ => StoreError::Write,
                }
            });

        CALIBRATION_SAVED.signal(result);
    }
}
