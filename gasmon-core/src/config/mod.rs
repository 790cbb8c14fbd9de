//! Configuration types
//!
//! The monitor configuration is built once at boot and handed to every
//! component by reference. Calibration overrides are stored separately in
//! flash as postcard-serialized records.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
