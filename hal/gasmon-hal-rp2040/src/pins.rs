//! Config-driven pin allocation
//!
//! General-purpose GPIOs are handed out by number, so the load cell, LED
//! and button wiring comes from `device.toml` instead of the source.
//! Pins with a fixed board function never enter the bank.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{ADC, DMA_CH0, FLASH, PIN_0, PIN_1, PIN_29, UART0, WATCHDOG};
use embassy_rp::{Peri, Peripherals};

/// Number of user GPIOs on the RP2040
pub const GPIO_COUNT: u8 = 30;

/// Pins with a fixed board function: co-processor UART and battery sense
pub const RESERVED_PINS: [u8; 3] = [0, 1, 29];

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for a board function
    Reserved,
}

/// Fixed-function peripherals left over after building the pin bank
pub struct BoardPeripherals {
    /// UART0 TX to the network co-processor
    pub link_tx: Peri<'static, PIN_0>,
    /// UART0 RX from the network co-processor
    pub link_rx: Peri<'static, PIN_1>,
    /// VSYS divider (ADC3)
    pub battery_sense: Peri<'static, PIN_29>,
    pub uart0: Peri<'static, UART0>,
    pub adc: Peri<'static, ADC>,
    pub flash: Peri<'static, FLASH>,
    pub dma_ch0: Peri<'static, DMA_CH0>,
    pub watchdog: Peri<'static, WATCHDOG>,
}

/// General-purpose GPIOs, taken by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT as usize],
}

impl PinBank {
    /// Split the chip peripherals into the pin bank and the board peripherals
    pub fn split(p: Peripherals) -> (Self, BoardPeripherals) {
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                None,
            ],
        };
        let board = BoardPeripherals {
            link_tx: p.PIN_0,
            link_rx: p.PIN_1,
            battery_sense: p.PIN_29,
            uart0: p.UART0,
            adc: p.ADC,
            flash: p.FLASH,
            dma_ch0: p.DMA_CH0,
            watchdog: p.WATCHDOG,
        };
        (bank, board)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if pin_num >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if RESERVED_PINS.contains(&pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}
