//! Cooperative device controller
//!
//! Owns every core component plus the hardware collaborators and runs one
//! scheduling pass per `tick`: watchdog, button input, battery, the
//! sample → estimate → decide → send pipeline, sleep gating and the LED.

pub mod calibration;
pub mod device;
pub mod indicator;
pub mod report;

pub use calibration::{average_raw, CalibrationError, CalibrationKind, CalibrationReport};
pub use device::{DeviceController, DeviceIo};
pub use indicator::{led_pattern, IndicatorInputs};
pub use report::{TickReport, TransmissionReport};
