//! Network co-processor link protocol
//!
//! This crate defines the UART-based protocol between the monitor's main
//! controller and the Wi-Fi/MQTT co-processor ("modem"). The controller
//! never speaks MQTT itself: it configures the modem once and then hands
//! it topic/payload pairs to publish.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬──────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH   │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 2B (LE)  │ 1B   │ 0–640B      │ 1B       │
//! └───────┴──────────┴──────┴─────────────┴──────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{ControllerMessage, ModemMessage};
