//! Status LED task
//!
//! Renders the current pattern, sleeping until the next edge or a new
//! pattern from the controller.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Instant, Timer};

use gasmon_core::traits::StatusIndicator;
use gasmon_drivers::led::BlinkingLed;

use crate::channels::LED_PATTERN;

#[embassy_executor::task]
pub async fn led_task(mut led: BlinkingLed<Output<'static>>) {
    info!("LED task started");

    loop {
        let next_edge = led.update(Instant::now().as_millis());

        let pattern = match next_edge {
            Some(at) => match select(LED_PATTERN.wait(), Timer::at(Instant::from_millis(at))).await
            {
                Either::First(pattern) => pattern,
                Either::Second(()) => continue,
            },
            None => LED_PATTERN.wait().await,
        };

        trace!("LED pattern: {:?}", pattern);
        led.set_pattern(pattern);
    }
}
