//! Blinking status LED
//!
//! Renders a `LedPattern` on a GPIO pin. The owner calls `update` with the
//! current time and sleeps until the returned deadline.

use embedded_hal::digital::OutputPin;
use gasmon_core::traits::{LedPattern, StatusIndicator};

/// Status LED on a GPIO pin
pub struct BlinkingLed<P> {
    pin: P,
    /// If true, LED on = pin LOW
    inverted: bool,
    pattern: LedPattern,
    /// Pattern start time; `None` until the next `update`
    started_ms: Option<u64>,
    lit: bool,
}

impl<P: OutputPin> BlinkingLed<P> {
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            inverted,
            pattern: LedPattern::Off,
            started_ms: None,
            lit: false,
        };
        led.drive(false);
        led
    }

    fn drive(&mut self, on: bool) {
        self.lit = on;
        // GPIO writes on the supported chips are infallible
        let _ = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }

    /// Drive the pin for `now_ms`
    ///
    /// Returns the time of the next edge, or `None` for static patterns.
    pub fn update(&mut self, now_ms: u64) -> Option<u64> {
        let started = *self.started_ms.get_or_insert(now_ms);
        let elapsed = now_ms.saturating_sub(started);

        let on = self.pattern.is_on(elapsed);
        if on != self.lit {
            self.drive(on);
        }
        self.pattern.next_edge_in(elapsed).map(|dt| now_ms + dt)
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> StatusIndicator for BlinkingLed<P> {
    fn set_pattern(&mut self, pattern: LedPattern) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.started_ms = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
    }

    #[test]
    fn test_starts_off() {
        let led = BlinkingLed::new(MockPin { high: true }, false);
        assert!(!led.pin.high);

        let led = BlinkingLed::new(MockPin { high: false }, true);
        assert!(led.pin.high);
    }

    #[test]
    fn test_slow_blink_timeline() {
        let mut led = BlinkingLed::new(MockPin { high: false }, false);
        led.set_pattern(LedPattern::SlowBlink);

        assert_eq!(led.update(10_000), Some(10_500));
        assert!(led.pin.high);
        assert_eq!(led.update(10_500), Some(11_000));
        assert!(!led.pin.high);
        assert_eq!(led.update(11_000), Some(11_500));
        assert!(led.is_lit());
    }

    #[test]
    fn test_same_pattern_does_not_restart() {
        let mut led = BlinkingLed::new(MockPin { high: false }, false);
        led.set_pattern(LedPattern::SlowBlink);
        led.update(0);
        led.set_pattern(LedPattern::SlowBlink);
        // Still in the off phase of the original cycle
        led.update(700);
        assert!(!led.is_lit());
    }

    #[test]
    fn test_static_patterns() {
        let mut led = BlinkingLed::new(MockPin { high: false }, true);
        led.set_pattern(LedPattern::Solid);
        assert_eq!(led.update(5), None);
        assert!(!led.pin.high);

        led.set_pattern(LedPattern::Off);
        assert_eq!(led.update(6), None);
        assert!(led.pin.high);
    }
}
