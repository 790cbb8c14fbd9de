//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod calibration;
pub mod controller;
pub mod led;
pub mod link_rx;

pub use button::button_task;
pub use calibration::calibration_task;
pub use controller::controller_task;
pub use led::led_task;
pub use link_rx::link_rx_task;
