//! State machine definition

use super::events::DeviceEvent;

/// Device states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Power-on initialization
    #[default]
    Booting,
    /// Periodic sampling and reporting
    Running,
    /// Blocking calibration or tare routine in progress
    Calibrating,
    /// Waiting out the sleep interval
    Sleeping,
    /// Waiting for the chip reset; the watchdog is no longer fed
    Restarting,
}

impl DeviceState {
    /// Check if the sampling pipeline runs in this state
    pub fn samples(&self) -> bool {
        matches!(self, DeviceState::Running)
    }

    /// Check if the watchdog is fed in this state
    pub fn feeds_watchdog(&self) -> bool {
        !matches!(self, DeviceState::Restarting)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: DeviceEvent) -> Self {
        use DeviceEvent::*;
        use DeviceState::*;

        match (self, event) {
            // Restarting is terminal
            (Restarting, _) => Restarting,
            (_, RestartRequired) => Restarting,

            (Booting, BootComplete) => Running,

            (Running, CalibrationStarted) => Calibrating,
            (Running, SleepRequested) => Sleeping,

            (Calibrating, CalibrationFinished) => Running,

            (Sleeping, WakeUp) => Running,

            // Default: stay in current state
            _ => self,
        }
    }
}
