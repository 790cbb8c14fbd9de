//! Device lifecycle state machine
//!
//! The controller's behavior is a function of the current state and an
//! event. Transitions are explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::{ButtonEvent, DeviceEvent};
pub use machine::DeviceState;
