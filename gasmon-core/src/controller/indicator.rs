//! Status LED pattern selection

use crate::level::LevelStatus;
use crate::state::DeviceState;
use crate::traits::LedPattern;

/// Everything the LED pattern depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorInputs {
    pub state: DeviceState,
    /// Status of the last estimated level, if any
    pub status: Option<LevelStatus>,
    pub low_battery: bool,
    /// Last sample faulted
    pub sensor_fault: bool,
    /// At least one send has failed since the last success
    pub transmission_failing: bool,
}

/// Pick the LED pattern, most urgent condition first
///
/// While sleeping only the alarm patterns stay lit.
pub fn led_pattern(inputs: &IndicatorInputs) -> LedPattern {
    match inputs.state {
        DeviceState::Booting | DeviceState::Restarting => return LedPattern::Off,
        DeviceState::Sleeping => return alarm_pattern(inputs).unwrap_or(LedPattern::Off),
        DeviceState::Calibrating => return LedPattern::Solid,
        DeviceState::Running => {}
    }

    if inputs.sensor_fault {
        LedPattern::Flicker
    } else if let Some(alarm) = alarm_pattern(inputs) {
        alarm
    } else if inputs.status == Some(LevelStatus::Low) || inputs.low_battery {
        LedPattern::SlowBlink
    } else {
        LedPattern::Heartbeat
    }
}

/// Critical gas level or failing delivery
fn alarm_pattern(inputs: &IndicatorInputs) -> Option<LedPattern> {
    if inputs.status == Some(LevelStatus::Critical) {
        Some(LedPattern::FastBlink)
    } else if inputs.transmission_failing {
        Some(LedPattern::DoubleBlink)
    } else {
        None
    }
}
