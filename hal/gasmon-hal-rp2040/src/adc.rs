//! ADC channel adapter
//!
//! RP2040 has a single 12-bit ADC; GPIO26 to GPIO29 are its four external
//! channels. On the Pico, GPIO29 measures VSYS through a 3:1 divider.

use embassy_rp::adc::{Adc, Blocking, Channel};
use gasmon_drivers::sensor::AdcReader;

/// One ADC channel with exclusive use of the converter
pub struct AdcChannel {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl AdcChannel {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl AdcReader for AdcChannel {
    fn read(&mut self) -> Result<u16, ()> {
        self.adc.blocking_read(&mut self.channel).map_err(|_| ())
    }
}
