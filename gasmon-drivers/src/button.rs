//! Debounced calibration button
//!
//! Polled at a fixed rate. A press shorter than the long-press threshold
//! emits `ShortPress` on release; holding past the threshold emits
//! `LongPress` once, without waiting for release.

use embedded_hal::digital::InputPin;
use gasmon_core::state::ButtonEvent;

/// Default debounce time (ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 30;

/// Default long-press threshold (ms)
pub const DEFAULT_LONG_PRESS_MS: u64 = 3_000;

/// Debounced push button
pub struct CalibrationButton<P> {
    pin: P,
    /// If true, pressed = pin LOW
    active_low: bool,
    debounce_ms: u64,
    long_press_ms: u64,
    /// Last raw level and when it last changed
    raw_pressed: bool,
    raw_since_ms: u64,
    /// Debounced state
    pressed: bool,
    pressed_at_ms: u64,
    long_fired: bool,
}

impl<P: InputPin> CalibrationButton<P> {
    pub fn new(pin: P, active_low: bool, debounce_ms: u64, long_press_ms: u64) -> Self {
        Self {
            pin,
            active_low,
            debounce_ms,
            long_press_ms,
            raw_pressed: false,
            raw_since_ms: 0,
            pressed: false,
            pressed_at_ms: 0,
            long_fired: false,
        }
    }

    /// Button with the default timings
    pub fn with_defaults(pin: P, active_low: bool) -> Self {
        Self::new(pin, active_low, DEFAULT_DEBOUNCE_MS, DEFAULT_LONG_PRESS_MS)
    }

    fn read(&mut self) -> bool {
        // Treat a failed read as released
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => false,
        }
    }

    /// Sample the pin and return a completed gesture, if any
    pub fn poll(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        let raw = self.read();
        if raw != self.raw_pressed {
            self.raw_pressed = raw;
            self.raw_since_ms = now_ms;
        }

        let stable = now_ms.saturating_sub(self.raw_since_ms) >= self.debounce_ms;
        if stable && self.raw_pressed != self.pressed {
            self.pressed = self.raw_pressed;
            if self.pressed {
                self.pressed_at_ms = self.raw_since_ms;
                self.long_fired = false;
            } else if !self.long_fired {
                return Some(ButtonEvent::ShortPress);
            }
        }

        if self.pressed
            && !self.long_fired
            && now_ms.saturating_sub(self.pressed_at_ms) >= self.long_press_ms
        {
            self.long_fired = true;
            return Some(ButtonEvent::LongPress);
        }

        None
    }

    /// Debounced pressed state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct MockPin<'a>(&'a Cell<bool>);

    impl ErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl InputPin for MockPin<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    /// Poll every 10 ms from `from` to `to` (exclusive), collecting events
    fn run(button: &mut CalibrationButton<MockPin<'_>>, from: u64, to: u64) -> (u32, u32) {
        let mut short = 0;
        let mut long = 0;
        let mut t = from;
        while t < to {
            match button.poll(t) {
                Some(ButtonEvent::ShortPress) => short += 1,
                Some(ButtonEvent::LongPress) => long += 1,
                None => {}
            }
            t += 10;
        }
        (short, long)
    }

    #[test]
    fn test_short_press_on_release() {
        let level = Cell::new(true);
        let mut button = CalibrationButton::with_defaults(MockPin(&level), true);

        assert_eq!(run(&mut button, 0, 100), (0, 0));
        level.set(false);
        assert_eq!(run(&mut button, 100, 400), (0, 0));
        assert!(button.is_pressed());
        level.set(true);
        assert_eq!(run(&mut button, 400, 500), (1, 0));
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_bounce_is_ignored() {
        let level = Cell::new(true);
        let mut button = CalibrationButton::with_defaults(MockPin(&level), true);

        // 10 ms glitches never last the debounce time
        for i in 0..20 {
            level.set(i % 2 == 0);
            assert_eq!(button.poll(i * 10), None);
        }
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_long_press_fires_once_while_held() {
        let level = Cell::new(true);
        let mut button = CalibrationButton::with_defaults(MockPin(&level), true);

        level.set(false);
        assert_eq!(run(&mut button, 0, 3_020), (0, 1));
        assert_eq!(run(&mut button, 3_020, 6_000), (0, 0));
        // Release after a long press emits nothing
        level.set(true);
        assert_eq!(run(&mut button, 6_000, 6_100), (0, 0));
    }

    #[test]
    fn test_active_high_button() {
        let level = Cell::new(false);
        let mut button = CalibrationButton::with_defaults(MockPin(&level), false);
        level.set(true);
        run(&mut button, 0, 100);
        assert!(button.is_pressed());
    }
}
