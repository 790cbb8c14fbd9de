//! Events that trigger state transitions

/// Lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceEvent {
    /// Configuration loaded and peripherals initialized
    BootComplete,
    /// Calibration or tare routine started
    CalibrationStarted,
    /// Calibration or tare routine finished (successfully or not)
    CalibrationFinished,
    /// Send cycle complete and deep sleep is enabled
    SleepRequested,
    /// Sleep timer expired
    WakeUp,
    /// Transmission failure limit reached
    RestartRequired,
}

/// Calibration button input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Span calibration against the reference weight
    ShortPress,
    /// Tare the empty platform
    LongPress,
}
