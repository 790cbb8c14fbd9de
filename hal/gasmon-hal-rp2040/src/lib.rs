//! RP2040-specific HAL for the gas level monitor
//!
//! Implements the shared `gasmon-hal` traits for the RP2040 and provides
//! the board plumbing the firmware needs:
//!
//! - Config-driven GPIO allocation with board-reserved pins
//! - Battery ADC channel adapter for the divider driver
//! - Flash storage driver (implements `gasmon_hal::FlashStorage`)

#![no_std]

pub mod adc;
pub mod flash;
pub mod pins;

pub use gasmon_hal::{FlashStorage as FlashStorageTrait, StorageKey};
