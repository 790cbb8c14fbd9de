//! Hardware abstraction layer for the gas level monitor
//!
//! Chip-independent traits implemented by chip-specific HAL crates, so the
//! firmware's persistence code does not depend on one flash controller.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  gasmon-firmware             │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  gasmon-hal (this crate)     │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  gasmon-hal-rp2040           │
//! └──────────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
