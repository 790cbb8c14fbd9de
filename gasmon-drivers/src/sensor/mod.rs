//! Sensor drivers

pub mod battery;
pub mod hx711;

pub use battery::{AdcReader, DividerAdc};
pub use hx711::{Gain, Hx711, POWER_UP_SETTLE_US};
