//! Parameters of a calibration run.


use core::fmt;


/// The default largest trim value (the OSC32K `CALIB` field is 7 bits wide).
pub const DEFAULT_TRIM_MAX: u8 = 0b111_1111;

/// The default maximum relative error of an accepted trim value, in percent.
pub const DEFAULT_TOLERANCE_PERCENT: u32 = 1;


/// Converts a difference of [`TickSource`](crate::hal::TickSource) readings into milliseconds.
///
/// The converted value is `ticks * mul / div`. A time base that counts milliseconds of an
/// undivided clock uses `1/1`; one that counts milliseconds while the system clock is divided by 8
/// uses `8/1`; a 1024 Hz counter uses `1000/1024`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DivisorCorrection {
    pub mul: u32,
    pub div: u32,
}
impl DivisorCorrection {
    pub const IDENTITY: Self = Self::new(1, 1);

    pub const fn new(mul: u32, div: u32) -> Self {
        Self { mul, div }
    }

    /// Applies the correction to a tick count, saturating at [`u32::MAX`].
    ///
    /// Must not be called with `div == 0`; [`CalibrationConfig::validate`] rejects such
    /// corrections.
    pub const fn apply(&self, ticks: u32) -> u32 {
        let corrected = (ticks as u64) * (self.mul as u64) / (self.div as u64);
        if corrected > u32::MAX as u64 {
            u32::MAX
        } else {
            corrected as u32
        }
    }
}
impl Default for DivisorCorrection {
    fn default() -> Self {
        Self::IDENTITY
    }
}


/// A configuration that cannot be used for calibration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The lower bound of the trim range lies above the upper bound.
    InvertedTrimRange { low: u8, high: u8 },

    /// The reference frequency is zero.
    ZeroReferenceFrequency,

    /// The divisor correction would divide by zero.
    ZeroCorrectionDivisor,

    /// The measurement duration is too short to count a single reference cycle.
    NoEdges,

    /// The edge wait budget is zero, so no edge could ever be observed.
    ZeroEdgeTimeout,
}
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedTrimRange { low, high }
                => write!(f, "trim range {}..={} is inverted", low, high),
            Self::ZeroReferenceFrequency
                => write!(f, "reference frequency is zero"),
            Self::ZeroCorrectionDivisor
                => write!(f, "divisor correction has a zero denominator"),
            Self::NoEdges
                => write!(f, "measurement duration covers no reference cycles"),
            Self::ZeroEdgeTimeout
                => write!(f, "edge timeout is zero"),
        }
    }
}
impl core::error::Error for ConfigError {
}


/// Constants a calibration run is parameterized by.
///
/// Derived values (edge count, edge timeout, target duration) are computed from the base values on
/// demand; the edge timeout may be overridden with [`with_edge_timeout`](Self::with_edge_timeout).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    reference_frequency_hz: u32,
    device_clock_hz: u32,
    measurement_duration_ms: u32,
    trim_min: u8,
    trim_max: u8,
    correction: DivisorCorrection,
    tolerance_percent: u32,
    edge_timeout_override: Option<u32>,
}
impl CalibrationConfig {
    /// Creates a configuration with the full default trim range, no divisor correction and a
    /// tolerance of [`DEFAULT_TOLERANCE_PERCENT`].
    ///
    /// `device_clock_hz` is the rate at which the CPU polls the reference input; it only
    /// determines the default edge timeout.
    pub const fn new(reference_frequency_hz: u32, device_clock_hz: u32, measurement_duration_ms: u32) -> Self {
        Self {
            reference_frequency_hz,
            device_clock_hz,
            measurement_duration_ms,
            trim_min: 0,
            trim_max: DEFAULT_TRIM_MAX,
            correction: DivisorCorrection::IDENTITY,
            tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
            edge_timeout_override: None,
        }
    }

    pub const fn with_trim_range(mut self, trim_min: u8, trim_max: u8) -> Self {
        self.trim_min = trim_min;
        self.trim_max = trim_max;
        self
    }

    pub const fn with_divisor_correction(mut self, correction: DivisorCorrection) -> Self {
        self.correction = correction;
        self
    }

    pub const fn with_tolerance_percent(mut self, tolerance_percent: u32) -> Self {
        self.tolerance_percent = tolerance_percent;
        self
    }

    /// Replaces the derived edge timeout by an explicit number of polls.
    pub const fn with_edge_timeout(mut self, polls: u32) -> Self {
        self.edge_timeout_override = Some(polls);
        self
    }

    pub const fn reference_frequency_hz(&self) -> u32 { self.reference_frequency_hz }
    pub const fn device_clock_hz(&self) -> u32 { self.device_clock_hz }
    pub const fn measurement_duration_ms(&self) -> u32 { self.measurement_duration_ms }
    pub const fn trim_min(&self) -> u8 { self.trim_min }
    pub const fn trim_max(&self) -> u8 { self.trim_max }
    pub const fn correction(&self) -> DivisorCorrection { self.correction }
    pub const fn tolerance_percent(&self) -> u32 { self.tolerance_percent }

    /// The number of full reference cycles counted by one measurement.
    pub const fn edge_flips(&self) -> u32 {
        let flips = (self.measurement_duration_ms as u64) * (self.reference_frequency_hz as u64) / 1000;
        if flips > u32::MAX as u64 {
            u32::MAX
        } else {
            flips as u32
        }
    }

    /// The number of polls granted to each edge wait.
    ///
    /// Unless overridden, this is one more than the number of device clock cycles in a reference
    /// period, which is guaranteed to cover a half-period since a poll takes at least one cycle.
    pub const fn edge_timeout(&self) -> u32 {
        match self.edge_timeout_override {
            Some(polls) => polls,
            None => {
                if self.reference_frequency_hz == 0 {
                    0
                } else {
                    (self.device_clock_hz / self.reference_frequency_hz).saturating_add(1)
                }
            },
        }
    }

    /// The measurement expected when the oscillator runs at its nominal frequency, in
    /// milliseconds.
    pub const fn target_duration_ms(&self) -> u32 {
        if self.reference_frequency_hz == 0 {
            return 0;
        }
        let target = (self.edge_flips() as u64) * 1000 / (self.reference_frequency_hz as u64);
        if target > u32::MAX as u64 {
            u32::MAX
        } else {
            target as u32
        }
    }

    /// Whether a measurement deviating by `error` milliseconds from the target is acceptable.
    pub const fn within_tolerance(&self, error: u32) -> bool {
        (error as u64) * 100 <= (self.tolerance_percent as u64) * (self.target_duration_ms() as u64)
    }

    /// Checks the preconditions of a calibration run.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.trim_min > self.trim_max {
            return Err(ConfigError::InvertedTrimRange { low: self.trim_min, high: self.trim_max });
        }
        if self.reference_frequency_hz == 0 {
            return Err(ConfigError::ZeroReferenceFrequency);
        }
        if self.correction.div == 0 {
            return Err(ConfigError::ZeroCorrectionDivisor);
        }
        if self.edge_flips() == 0 {
            return Err(ConfigError::NoEdges);
        }
        if self.edge_timeout() == 0 {
            return Err(ConfigError::ZeroEdgeTimeout);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values_follow_the_reference() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 1_000);
        assert_eq!(config.edge_flips(), 1_000);
        assert_eq!(config.edge_timeout(), 4_001);
        assert_eq!(config.target_duration_ms(), 1_000);
        assert_eq!(config.trim_min(), 0);
        assert_eq!(config.trim_max(), 127);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn target_is_rounded_to_whole_cycles() {
        // 32.768 kHz for 10 ms => 327 cycles => 9.979 ms
        let config = CalibrationConfig::new(32_768, 16_000_000, 10);
        assert_eq!(config.edge_flips(), 327);
        assert_eq!(config.target_duration_ms(), 9);
    }

    #[test]
    fn explicit_edge_timeout_wins() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 1_000)
            .with_edge_timeout(3);
        assert_eq!(config.edge_timeout(), 3);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 500);
        assert_eq!(config.target_duration_ms(), 500);
        assert!(config.within_tolerance(0));
        assert!(config.within_tolerance(5));
        assert!(!config.within_tolerance(6));

        let loose = config.with_tolerance_percent(10);
        assert!(loose.within_tolerance(50));
        assert!(!loose.within_tolerance(51));
    }

    #[test]
    fn inverted_trim_range_is_rejected() {
        let config = CalibrationConfig::new(1_000, 4_000_000, 1_000)
            .with_trim_range(90, 10);
        assert_eq!(config.validate(), Err(ConfigError::InvertedTrimRange { low: 90, high: 10 }));
    }

    #[test]
    fn degenerate_configurations_are_rejected() {
        assert_eq!(
            CalibrationConfig::new(0, 4_000_000, 1_000).validate(),
            Err(ConfigError::ZeroReferenceFrequency),
        );
        assert_eq!(
            CalibrationConfig::new(1_000, 4_000_000, 1_000)
                .with_divisor_correction(DivisorCorrection::new(1, 0))
                .validate(),
            Err(ConfigError::ZeroCorrectionDivisor),
        );
        assert_eq!(
            CalibrationConfig::new(100, 4_000_000, 5).validate(),
            Err(ConfigError::NoEdges),
        );
        assert_eq!(
            CalibrationConfig::new(1_000, 4_000_000, 1_000)
                .with_edge_timeout(0)
                .validate(),
            Err(ConfigError::ZeroEdgeTimeout),
        );
    }

    #[test]
    fn correction_scales_and_saturates() {
        assert_eq!(DivisorCorrection::new(8, 1).apply(125), 1_000);
        assert_eq!(DivisorCorrection::new(1000, 1024).apply(1024), 1_000);
        assert_eq!(DivisorCorrection::new(2, 1).apply(u32::MAX), u32::MAX);
        assert_eq!(DivisorCorrection::default(), DivisorCorrection::IDENTITY);
    }

    #[test]
    fn errors_display() {
        assert_eq!(
            ConfigError::InvertedTrimRange { low: 5, high: 4 }.to_string(),
            "trim range 5..=4 is inverted",
        );
        assert_eq!(ConfigError::ZeroEdgeTimeout.to_string(), "edge timeout is zero");
    }
}
