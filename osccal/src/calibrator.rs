//! Binary search for the trim value that matches the reference clock.


use core::cmp::Ordering;
use core::fmt;

use embedded_hal::digital::InputPin;

use crate::config::{CalibrationConfig, ConfigError};
use crate::edge::ClockEdgeWaiter;
use crate::hal::{TickSource, TrimRegister};
use crate::measure::DurationMeasurer;


/// An accepted calibration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// The trim value to apply.
    pub trim: u8,

    /// The duration measured with `trim` applied, in milliseconds.
    pub measured_ms: u32,

    /// The absolute deviation of `measured_ms` from the target duration.
    pub error_ms: u32,
}


/// The reason a calibration attempt did not produce a usable trim value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// The reference signal did not transition within the edge timeout.
    ///
    /// The attempt was aborted at the first such occurrence; it can be repeated once the
    /// reference is available.
    NoSignal,

    /// The search converged, but the deviation at the final candidate exceeds the tolerance.
    ToleranceExceeded { trim: u8, measured_ms: u32, error_ms: u32 },
}
impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignal
                => write!(f, "no reference signal"),
            Self::ToleranceExceeded { trim, measured_ms, error_ms }
                => write!(f, "best trim value {} measured {} ms, {} ms off target", trim, measured_ms, error_ms),
        }
    }
}
impl core::error::Error for CalibrationError {
}


/// The outcome of [`Calibrator::run_calibration`].
pub type CalibrationResult = Result<Calibration, CalibrationError>;


/// The trim values that may still contain the optimum.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SearchRange {
    pub low: u8,
    pub high: u8,
}
impl SearchRange {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// The candidate to measure next (rounded down).
    pub const fn midpoint(&self) -> u8 {
        ((self.low as u16 + self.high as u16) / 2) as u8
    }
}


#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Probe {
    trim: u8,
    measured_ms: u32,
}


#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SearchState {
    /// `last` is the most recent measurement; its trim value is the previous midpoint.
    Searching { range: SearchRange, last: Option<Probe> },
    Converged(Probe),
    Aborted,
}


/// Searches the trim domain for the value at which the measured duration matches the target.
///
/// The search assumes that the measured duration does not decrease as the trim value increases.
pub struct Calibrator<P, T, R> {
    measurer: DurationMeasurer<P, T, R>,
    config: CalibrationConfig,
}
impl<P: InputPin, T: TickSource, R: TrimRegister> Calibrator<P, T, R> {
    /// Creates a calibrator, refusing configurations that violate the preconditions of a search.
    pub fn new(measurer: DurationMeasurer<P, T, R>, config: CalibrationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { measurer, config })
    }

    /// Creates a calibrator directly from the hardware capabilities.
    pub fn from_parts(reference: P, ticks: T, trim: R, config: CalibrationConfig) -> Result<Self, ConfigError> {
        let waiter = ClockEdgeWaiter::new(reference, config.edge_timeout());
        let measurer = DurationMeasurer::new(waiter, ticks, trim, config.correction());
        Self::new(measurer, config)
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn measurer(&mut self) -> &mut DurationMeasurer<P, T, R> {
        &mut self.measurer
    }

    pub fn release(self) -> DurationMeasurer<P, T, R> {
        self.measurer
    }

    /// The largest number of measurements a single [`run_calibration`](Self::run_calibration)
    /// performs.
    pub fn max_measurements(&self) -> u32 {
        let candidates = u32::from(self.config.trim_max() - self.config.trim_min()) + 1;
        let halvings = u32::BITS - (candidates - 1).leading_zeros();
        halvings + 1
    }

    /// Performs one calibration attempt.
    ///
    /// The trim register holds the same value when this returns as when it was called. Nothing is
    /// retried; on failure, the caller decides whether and when to try again.
    pub fn run_calibration(&mut self) -> CalibrationResult {
        let mut state = SearchState::Searching {
            range: SearchRange::new(self.config.trim_min(), self.config.trim_max()),
            last: None,
        };
        loop {
            state = match state {
                SearchState::Searching { range, last } => self.step(range, last),
                SearchState::Converged(probe) => return self.judge(probe),
                SearchState::Aborted => {
                    warn!("reference signal lost; calibration aborted");
                    return Err(CalibrationError::NoSignal);
                },
            };
        }
    }

    fn step(&mut self, range: SearchRange, last: Option<Probe>) -> SearchState {
        let mid = range.midpoint();

        // floor division keeps producing the same midpoint once low and high are adjacent
        if let Some(probe) = last {
            if probe.trim == mid {
                return SearchState::Converged(probe);
            }
        }

        let Some(measured_ms) = self.measurer.time_for_value(mid, self.config.edge_flips()) else {
            return SearchState::Aborted;
        };
        trace!("trim {=u8} in {=u8}..={=u8}: {=u32} ms", mid, range.low, range.high, measured_ms);

        let probe = Probe { trim: mid, measured_ms };
        let range = match measured_ms.cmp(&self.config.target_duration_ms()) {
            Ordering::Equal => return SearchState::Converged(probe),
            // too few ticks: the oscillator is slow
            Ordering::Less => SearchRange { low: mid, ..range },
            Ordering::Greater => SearchRange { high: mid, ..range },
        };

        if range.low < range.high {
            SearchState::Searching { range, last: Some(probe) }
        } else {
            SearchState::Converged(probe)
        }
    }

    fn judge(&self, probe: Probe) -> CalibrationResult {
        let error_ms = self.config.target_duration_ms().abs_diff(probe.measured_ms);
        if self.config.within_tolerance(error_ms) {
            debug!("converged on trim {=u8} ({=u32} ms off)", probe.trim, error_ms);
            Ok(Calibration { trim: probe.trim, measured_ms: probe.measured_ms, error_ms })
        } else {
            warn!("converged on trim {=u8} but {=u32} ms off target", probe.trim, error_ms);
            Err(CalibrationError::ToleranceExceeded {
                trim: probe.trim,
                measured_ms: probe.measured_ms,
                error_ms,
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::digital::ErrorType;

    use super::*;

    /// Toggles on every read.
    struct Toggle(bool);
    impl ErrorType for Toggle {
        type Error = Infallible;
    }
    impl InputPin for Toggle {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.0 = !self.0;
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.0 = !self.0;
            Ok(!self.0)
        }
    }

    struct Frozen;
    impl TickSource for Frozen {
        fn now(&mut self) -> u32 {
            0
        }
    }

    struct Plain(u8);
    impl TrimRegister for Plain {
        fn read(&mut self) -> u8 {
            self.0
        }

        fn write(&mut self, value: u8) {
            self.0 = value;
        }
    }

    fn calibrator(config: CalibrationConfig) -> Result<Calibrator<Toggle, Frozen, Plain>, ConfigError> {
        Calibrator::from_parts(Toggle(false), Frozen, Plain(0), config)
    }

    #[test]
    fn midpoint_rounds_down() {
        assert_eq!(SearchRange::new(0, 127).midpoint(), 63);
        assert_eq!(SearchRange::new(126, 127).midpoint(), 126);
        assert_eq!(SearchRange::new(255, 255).midpoint(), 255);
        assert_eq!(SearchRange::new(254, 255).midpoint(), 254);
    }

    #[test]
    fn inverted_range_is_rejected_before_searching() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 100)
            .with_trim_range(10, 9);
        assert!(matches!(
            calibrator(config),
            Err(ConfigError::InvertedTrimRange { low: 10, high: 9 }),
        ));
    }

    #[test]
    fn measurement_bound_covers_the_domain() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 100);
        assert_eq!(calibrator(config).map(|c| c.max_measurements()), Ok(8));

        let single = config.with_trim_range(5, 5);
        assert_eq!(calibrator(single).map(|c| c.max_measurements()), Ok(1));

        let byte = config.with_trim_range(0, 255);
        assert_eq!(calibrator(byte).map(|c| c.max_measurements()), Ok(9));
    }

    #[test]
    fn frozen_time_base_exceeds_tolerance() {
        // every candidate measures 0 ms, so the search walks up to the top of the range
        let config = CalibrationConfig::new(1_000, 4_000_000, 100);
        let mut calibrator = calibrator(config).unwrap();
        assert_eq!(
            calibrator.run_calibration(),
            Err(CalibrationError::ToleranceExceeded { trim: 126, measured_ms: 0, error_ms: 100 }),
        );
        assert_eq!(calibrator.measurer().trim_register().read(), 0);
    }

    #[test]
    fn errors_display() {
        assert_eq!(CalibrationError::NoSignal.to_string(), "no reference signal");
        assert_eq!(
            CalibrationError::ToleranceExceeded { trim: 3, measured_ms: 90, error_ms: 10 }.to_string(),
            "best trim value 3 measured 90 ms, 10 ms off target",
        );
    }
}
