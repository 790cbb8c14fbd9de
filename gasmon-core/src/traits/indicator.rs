//! Status LED and watchdog traits

/// Blink pattern shown on the status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedPattern {
    /// LED off (sleeping)
    #[default]
    Off,
    /// Continuously on (calibration in progress)
    Solid,
    /// Short blip every 2 s (all normal)
    Heartbeat,
    /// 1 Hz blink (low gas or low battery)
    SlowBlink,
    /// 4 Hz blink (critical gas)
    FastBlink,
    /// Two short flashes every 1.5 s (transmission failing)
    DoubleBlink,
    /// 10 Hz flicker (sensor fault)
    Flicker,
}

impl LedPattern {
    /// Whether the LED is lit `elapsed_ms` after the pattern started
    pub fn is_on(&self, elapsed_ms: u64) -> bool {
        match self {
            LedPattern::Off => false,
            LedPattern::Solid => true,
            LedPattern::Heartbeat => elapsed_ms % 2000 < 50,
            LedPattern::SlowBlink => elapsed_ms % 1000 < 500,
            LedPattern::FastBlink => elapsed_ms % 250 < 125,
            LedPattern::DoubleBlink => {
                let t = elapsed_ms % 1500;
                t < 100 || (200..300).contains(&t)
            }
            LedPattern::Flicker => elapsed_ms % 100 < 50,
        }
    }

    /// Time until the LED output next changes (ms)
    ///
    /// Returns `None` for static patterns.
    pub fn next_edge_in(&self, elapsed_ms: u64) -> Option<u64> {
        let edges: &[u64] = match self {
            LedPattern::Off | LedPattern::Solid => return None,
            LedPattern::Heartbeat => &[50, 2000],
            LedPattern::SlowBlink => &[500, 1000],
            LedPattern::FastBlink => &[125, 250],
            LedPattern::DoubleBlink => &[100, 200, 300, 1500],
            LedPattern::Flicker => &[50, 100],
        };
        let period = edges[edges.len() - 1];
        let t = elapsed_ms % period;
        edges.iter().find(|&&edge| edge > t).map(|&edge| edge - t)
    }
}

/// Trait for the status indicator
pub trait StatusIndicator {
    /// Switch to a new blink pattern
    ///
    /// Implementations restart the pattern only when it changes.
    fn set_pattern(&mut self, pattern: LedPattern);
}

/// Trait for the hardware watchdog
pub trait Watchdog {
    /// Reset the watchdog countdown
    fn feed(&mut self);
}
