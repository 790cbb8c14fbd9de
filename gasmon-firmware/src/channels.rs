//! Inter-task communication channels
//!
//! Static embassy-sync primitives connecting the controller task with the
//! button, LED, link and flash tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use gasmon_core::config::CalibrationProfile;
use gasmon_core::state::ButtonEvent;
use gasmon_core::traits::{LedPattern, StoreError};

/// Button presses waiting for the controller
const BUTTON_CHANNEL_SIZE: usize = 4;

/// Publish outcome reported by the co-processor
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublishAck {
    pub seq: u8,
    pub ok: bool,
}

/// Debounced button gestures
pub static BUTTON_EVENTS: Channel<CriticalSectionRawMutex, ButtonEvent, BUTTON_CHANNEL_SIZE> =
    Channel::new();

/// Pattern the LED task should render
pub static LED_PATTERN: Signal<CriticalSectionRawMutex, LedPattern> = Signal::new();

/// Latest `PublishResult` from the co-processor
pub static PUBLISH_RESULT: Signal<CriticalSectionRawMutex, PublishAck> = Signal::new();

/// A `Pong` arrived
pub static PONG_RECEIVED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// MQTT session state from the last `LinkState`
///
/// Starts optimistic so publishing works with a co-processor that never
/// reports link state.
pub static MQTT_UP: AtomicBool = AtomicBool::new(true);

/// Calibration profile to persist
pub static CALIBRATION_SAVE: Channel<CriticalSectionRawMutex, CalibrationProfile, 1> =
    Channel::new();

/// Result of the last calibration save
pub static CALIBRATION_SAVED: Signal<CriticalSectionRawMutex, Result<(), StoreError>> =
    Signal::new();
