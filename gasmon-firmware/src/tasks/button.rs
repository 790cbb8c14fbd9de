//! Calibration button task
//!
//! Polls the debounced button and forwards gestures to the controller.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant, Ticker};

use gasmon_drivers::button::CalibrationButton;

use crate::channels::BUTTON_EVENTS;

/// Poll period; well below the debounce time
const POLL_INTERVAL_MS: u64 = 10;

#[embassy_executor::task]
pub async fn button_task(mut button: CalibrationButton<Input<'static>>) {
    info!("Button task started");

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        ticker.next().await;

        if let Some(event) = button.poll(Instant::now().as_millis()) {
            debug!("Button: {:?}", event);
            if BUTTON_EVENTS.try_send(event).is_err() {
                warn!("Button channel full, dropping {:?}", event);
            }
        }
    }
}
