//! Calibration and tare routines

use crate::config::CalibrationProfile;
use crate::state::ButtonEvent;
use crate::traits::{LoadCell, SensorError, StoreError, Watchdog};

/// Errors from the calibration routines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Sample count configured as zero
    NoSamples,
    /// Resulting profile is unusable (zero span, non-finite average)
    InvalidFactor,
    /// Fewer than half of the raw reads succeeded
    Sensor(SensorError),
    /// Profile applied but could not be persisted
    Store(StoreError),
}

impl From<SensorError> for CalibrationError {
    fn from(e: SensorError) -> Self {
        CalibrationError::Sensor(e)
    }
}

impl From<StoreError> for CalibrationError {
    fn from(e: StoreError) -> Self {
        CalibrationError::Store(e)
    }
}

/// Which routine a button press runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationKind {
    /// Span calibration against the reference weight
    Span,
    /// Zero the empty platform
    Tare,
}

impl From<ButtonEvent> for CalibrationKind {
    fn from(event: ButtonEvent) -> Self {
        match event {
            ButtonEvent::ShortPress => CalibrationKind::Span,
            ButtonEvent::LongPress => CalibrationKind::Tare,
        }
    }
}

/// Outcome of one calibration routine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    pub kind: CalibrationKind,
    pub result: Result<CalibrationProfile, CalibrationError>,
}

/// Average `samples` raw reads, feeding the watchdog between reads
///
/// Failed reads are skipped; at least half must succeed.
pub fn average_raw<S: LoadCell, W: Watchdog>(
    load_cell: &mut S,
    watchdog: &mut W,
    samples: u8,
) -> Result<f32, CalibrationError> {
    if samples == 0 {
        return Err(CalibrationError::NoSamples);
    }

    let mut sum: i64 = 0;
    let mut good: u32 = 0;
    let mut last_error = SensorError::Timeout;

    for _ in 0..samples {
        watchdog.feed();
        match load_cell.read_raw() {
            Ok(raw) => {
                sum += raw as i64;
                good += 1;
            }
            Err(e) => last_error = e,
        }
    }

    if good == 0 || good * 2 < samples as u32 {
        return Err(CalibrationError::Sensor(last_error));
    }

    Ok(sum as f32 / good as f32)
}

/// Profile produced by a routine from the averaged raw reading
pub fn apply(
    kind: CalibrationKind,
    profile: &CalibrationProfile,
    average: f32,
    reference_weight_kg: f32,
) -> Result<CalibrationProfile, CalibrationError> {
    let next = match kind {
        CalibrationKind::Span => profile.calibrated(average, reference_weight_kg),
        CalibrationKind::Tare => profile.tared(average),
    };
    next.ok_or(CalibrationError::InvalidFactor)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cell {
        values: [Result<i32, SensorError>; 4],
        index: usize,
    }

    impl LoadCell for Cell {
        fn read_raw(&mut self) -> Result<i32, SensorError> {
            let v = self.values[self.index % 4];
            self.index += 1;
            v
        }
    }

    struct CountingWatchdog(u32);

    impl Watchdog for CountingWatchdog {
        fn feed(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_average_feeds_watchdog_per_sample() {
        let mut cell = Cell {
            values: [Ok(100), Ok(200), Ok(300), Ok(400)],
            index: 0,
        };
        let mut wd = CountingWatchdog(0);
        assert_eq!(average_raw(&mut cell, &mut wd, 4), Ok(250.0));
        assert_eq!(wd.0, 4);
    }

    #[test]
    fn test_average_skips_occasional_faults() {
        let mut cell = Cell {
            values: [Ok(100), Err(SensorError::Timeout), Ok(300), Ok(200)],
            index: 0,
        };
        let mut wd = CountingWatchdog(0);
        assert_eq!(average_raw(&mut cell, &mut wd, 4), Ok(200.0));
    }

    #[test]
    fn test_average_fails_when_mostly_faulty() {
        let mut cell = Cell {
            values: [
                Err(SensorError::Disconnected),
                Err(SensorError::Disconnected),
                Err(SensorError::Disconnected),
                Ok(5),
            ],
            index: 0,
        };
        let mut wd = CountingWatchdog(0);
        assert_eq!(
            average_raw(&mut cell, &mut wd, 4),
            Err(CalibrationError::Sensor(SensorError::Disconnected))
        );
        assert_eq!(
            average_raw(&mut cell, &mut wd, 0),
            Err(CalibrationError::NoSamples)
        );
    }

    #[test]
    fn test_apply_span_and_tare() {
        let profile = CalibrationProfile {
            calibration_factor: 1.0,
            tare_offset: 1000,
            empty_weight_kg: 15.0,
            full_weight_kg: 29.0,
        };
        let spanned = apply(CalibrationKind::Span, &profile, 31_000.0, 15.0).unwrap();
        assert_eq!(spanned.calibration_factor, 2000.0);

        let tared = apply(CalibrationKind::Tare, &profile, 4321.0, 15.0).unwrap();
        assert_eq!(tared.tare_offset, 4321);

        assert_eq!(
            apply(CalibrationKind::Span, &profile, 1000.0, 15.0),
            Err(CalibrationError::InvalidFactor)
        );
    }

    #[test]
    fn test_button_mapping() {
        assert_eq!(CalibrationKind::from(ButtonEvent::ShortPress), CalibrationKind::Span);
        assert_eq!(CalibrationKind::from(ButtonEvent::LongPress), CalibrationKind::Tare);
    }
}
