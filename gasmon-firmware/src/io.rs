//! Collaborator adapters owned by the controller
//!
//! Bridge the core's indicator, watchdog and storage traits onto tasks and
//! RP2040 peripherals.

use defmt::*;
use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::Watchdog as RpWatchdog;
use embassy_rp::Peri;
use embassy_time::{with_timeout, Duration};

use gasmon_core::config::CalibrationProfile;
use gasmon_core::traits::{CalibrationStore, LedPattern, StatusIndicator, StoreError, Watchdog};

use crate::channels::{CALIBRATION_SAVE, CALIBRATION_SAVED, LED_PATTERN};

/// Longest period the RP2040 watchdog counter can hold
const MAX_WATCHDOG_PERIOD_MS: u32 = 8_000;

/// Flash writes finish well within this
const SAVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Forwards LED patterns to the LED task
pub struct SignalIndicator;

impl StatusIndicator for SignalIndicator {
    fn set_pattern(&mut self, pattern: LedPattern) {
        LED_PATTERN.signal(pattern);
    }
}

/// Hardware watchdog
pub struct HardwareWatchdog {
    inner: RpWatchdog,
}

impl HardwareWatchdog {
    pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
        Self {
            inner: RpWatchdog::new(watchdog),
        }
    }

    /// Arm the watchdog
    ///
    /// Timeouts beyond the counter range are clamped; the controller feeds
    /// every tick, far more often than either bound.
    pub fn start(&mut self, timeout_ms: u32) {
        let period = if timeout_ms > MAX_WATCHDOG_PERIOD_MS {
            warn!(
                "Watchdog timeout {} ms clamped to {} ms",
                timeout_ms, MAX_WATCHDOG_PERIOD_MS
            );
            MAX_WATCHDOG_PERIOD_MS
        } else {
            timeout_ms
        };
        self.inner.pause_on_debug(true);
        self.inner.start(Duration::from_millis(period as u64));
        info!("Watchdog armed: {} ms", period);
    }

    /// Reset the chip through the watchdog
    pub fn reset_now(&mut self) -> ! {
        self.inner.trigger_reset();
        loop {
            cortex_m::asm::nop();
        }
    }
}

impl Watchdog for HardwareWatchdog {
    fn feed(&mut self) {
        self.inner.feed();
    }
}

/// Persists calibration through the flash task
pub struct FlashCalibrationStore;

impl CalibrationStore for FlashCalibrationStore {
    async fn save(&mut self, profile: &CalibrationProfile) -> Result<(), StoreError> {
        CALIBRATION_SAVED.reset();
        if CALIBRATION_SAVE.try_send(*profile).is_err() {
            return Err(StoreError::Unavailable);
        }
        with_timeout(SAVE_TIMEOUT, CALIBRATION_SAVED.wait())
            .await
            .unwrap_or(Err(StoreError::Unavailable))
    }
}
