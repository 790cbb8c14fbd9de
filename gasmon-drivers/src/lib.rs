//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in gasmon-core, built on `embedded-hal` 1.0:
//!
//! - HX711 load cell amplifier (bit-banged)
//! - Battery voltage divider ADC with oversampling
//! - Blinking status LED
//! - Debounced calibration button

#![no_std]
#![deny(unsafe_code)]

pub mod button;
pub mod led;
pub mod sensor;
