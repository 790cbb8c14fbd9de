//! Hardware and collaborator abstraction traits
//!
//! These traits define the interface between the application logic
//! and board-specific implementations.

pub mod indicator;
pub mod sensor;
pub mod storage;
pub mod transport;

pub use indicator::{LedPattern, StatusIndicator, Watchdog};
pub use sensor::{BatteryAdc, LoadCell, SensorError};
pub use storage::{CalibrationStore, StoreError};
pub use transport::Transport;
