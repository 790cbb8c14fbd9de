//! HX711 24-bit load cell amplifier
//!
//! Two-wire serial interface driven by bit-banging:
//! - DOUT goes low when a conversion is ready
//! - 24 SCK pulses shift the result out MSB first (two's complement)
//! - 1 to 3 extra pulses select channel and gain for the next conversion
//! - SCK held high for more than 60 µs powers the chip down

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use gasmon_core::traits::{LoadCell, SensorError};

/// Largest positive conversion result
const RAW_MAX: i32 = 0x7F_FFFF;

/// Most negative conversion result
const RAW_MIN: i32 = -0x80_0000;

/// Ready polling step (µs)
const POLL_STEP_US: u32 = 100;

/// Consecutive timeouts after which the amplifier is reported missing
const DISCONNECT_AFTER_TIMEOUTS: u8 = 3;

/// First conversion after power-up or reset (µs); about 400 ms at 10 SPS
pub const POWER_UP_SETTLE_US: u32 = 450_000;

/// Channel and gain for the next conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Channel A, gain 128
    #[default]
    A128,
    /// Channel B, gain 32
    B32,
    /// Channel A, gain 64
    A64,
}

impl Gain {
    /// Extra SCK pulses after the 24 data bits
    const fn extra_pulses(&self) -> u8 {
        match self {
            Gain::A128 => 1,
            Gain::B32 => 2,
            Gain::A64 => 3,
        }
    }
}

/// HX711 driver
pub struct Hx711<SCK, DOUT, D> {
    sck: SCK,
    dout: DOUT,
    delay: D,
    gain: Gain,
    /// Maximum wait for DOUT to go low (µs)
    ready_timeout_us: u32,
    timeouts: u8,
    /// Next wait covers the power-up conversion
    settling: bool,
}

impl<SCK, DOUT, D> Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayNs,
{
    /// Create a driver
    ///
    /// At 10 SPS a conversion takes 100 ms, so `ready_timeout_us` should be
    /// comfortably above that.
    pub fn new(sck: SCK, dout: DOUT, delay: D, gain: Gain, ready_timeout_us: u32) -> Self {
        let mut hx = Self {
            sck,
            dout,
            delay,
            gain,
            ready_timeout_us,
            timeouts: 0,
            settling: true,
        };
        // SCK must idle low or the chip powers down
        let _ = hx.sck.set_low();
        hx
    }

    /// Check whether a conversion is ready
    pub fn is_ready(&mut self) -> Result<bool, SensorError> {
        self.dout.is_low().map_err(|_| SensorError::ConversionError)
    }

    fn wait_ready(&mut self) -> Result<(), SensorError> {
        let timeout_us = if self.settling {
            self.ready_timeout_us.max(POWER_UP_SETTLE_US)
        } else {
            self.ready_timeout_us
        };
        self.settling = false;

        let mut waited = 0u32;
        while !self.is_ready()? {
            if waited >= timeout_us {
                self.timeouts = self.timeouts.saturating_add(1);
                return Err(if self.timeouts >= DISCONNECT_AFTER_TIMEOUTS {
                    SensorError::Disconnected
                } else {
                    SensorError::Timeout
                });
            }
            self.delay.delay_us(POLL_STEP_US);
            waited += POLL_STEP_US;
        }
        self.timeouts = 0;
        Ok(())
    }

    fn pulse(&mut self) -> Result<(), SensorError> {
        self.sck.set_high().map_err(|_| SensorError::ConversionError)?;
        self.delay.delay_us(1);
        self.sck.set_low().map_err(|_| SensorError::ConversionError)?;
        self.delay.delay_us(1);
        Ok(())
    }

    fn shift_in(&mut self) -> Result<u32, SensorError> {
        let mut value: u32 = 0;
        for _ in 0..24 {
            self.sck.set_high().map_err(|_| SensorError::ConversionError)?;
            self.delay.delay_us(1);
            let bit = self.dout.is_high().map_err(|_| SensorError::ConversionError)?;
            value = (value << 1) | bit as u32;
            self.sck.set_low().map_err(|_| SensorError::ConversionError)?;
            self.delay.delay_us(1);
        }
        for _ in 0..self.gain.extra_pulses() {
            self.pulse()?;
        }
        Ok(value)
    }

    /// Enter power-down mode
    pub fn power_down(&mut self) {
        let _ = self.sck.set_low();
        let _ = self.sck.set_high();
        self.delay.delay_us(80);
    }

    /// Leave power-down mode
    ///
    /// The next read allows up to `POWER_UP_SETTLE_US` for the first
    /// conversion.
    pub fn power_up(&mut self) {
        let _ = self.sck.set_low();
        self.settling = true;
    }
}

/// Sign-extend a 24-bit two's complement value
fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}

impl<SCK, DOUT, D> LoadCell for Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayNs,
{
    fn read_raw(&mut self) -> Result<i32, SensorError> {
        self.wait_ready()?;
        let raw = sign_extend_24(self.shift_in()?);
        if raw == RAW_MAX || raw == RAW_MIN {
            return Err(SensorError::Saturated);
        }
        Ok(raw)
    }
}
