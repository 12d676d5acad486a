//! Property-based tests of the search over monotonic trim-to-duration mappings.

mod sim;

#[cfg(test)]
mod proptest_search {
    use osccal::CalibrationError;
    use proptest::prelude::*;

    use crate::sim::{config, Sim};

    /// `base + slope * trim`, never decreasing.
    fn rising(base: u32, slope: u32) -> impl Fn(u8) -> u32 {
        move |trim| base + slope * u32::from(trim)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // --- bounded number of measurements ---

        #[test]
        fn measurements_are_bounded(
            base in 0u32..1_000,
            slope in 0u32..8,
            initial in 0u8..=127,
        ) {
            let sim = Sim::new(&config(), initial, rising(base, slope));
            let mut calibrator = sim.calibrator(config());
            let _ = calibrator.run_calibration();

            prop_assert!(
                sim.measurements() as u32 <= calibrator.max_measurements(),
                "{} measurements, at most {} allowed", sim.measurements(), calibrator.max_measurements(),
            );
        }

        // --- an exact match is always found (below the top of the range) ---

        #[test]
        fn exact_match_is_found(
            trim_star in 0u8..127,
            slope in 1i64..8,
        ) {
            let centre = i64::from(trim_star);
            let sim = Sim::new(&config(), 64, move |trim| {
                (500 + (i64::from(trim) - centre) * slope).max(0) as u32
            });
            let mut calibrator = sim.calibrator(config());
            let result = calibrator.run_calibration();

            prop_assert_eq!(result.map(|c| (c.trim, c.error_ms)), Ok((trim_star, 0)));
        }

        // --- never success if nothing is within tolerance ---

        #[test]
        fn all_fast_never_succeeds(
            base in 506u32..2_000,
            slope in 0u32..10,
        ) {
            let sim = Sim::new(&config(), 64, rising(base, slope));
            let mut calibrator = sim.calibrator(config());
            let result = calibrator.run_calibration();

            prop_assert!(
                matches!(result, Err(CalibrationError::ToleranceExceeded { .. })),
                "expected tolerance failure, got {:?}", result,
            );
        }

        #[test]
        fn all_slow_never_succeeds(
            top in 0u32..495,
            slope in 0u32..4,
        ) {
            let sim = Sim::new(&config(), 64, move |trim| {
                top.saturating_sub(slope * u32::from(127 - trim))
            });
            let mut calibrator = sim.calibrator(config());
            let result = calibrator.run_calibration();

            prop_assert!(
                matches!(result, Err(CalibrationError::ToleranceExceeded { .. })),
                "expected tolerance failure, got {:?}", result,
            );
        }

        // --- idempotence and register restoration ---

        #[test]
        fn repeated_runs_agree_and_restore(
            base in 0u32..1_000,
            slope in 0u32..8,
            initial in 0u8..=127,
        ) {
            let sim = Sim::new(&config(), initial, rising(base, slope));
            let mut calibrator = sim.calibrator(config());

            let first = calibrator.run_calibration();
            prop_assert_eq!(sim.trim(), initial);
            let second = calibrator.run_calibration();
            prop_assert_eq!(sim.trim(), initial);

            prop_assert_eq!(first, second);
            prop_assert!(sim.restores().iter().all(|&trim| trim == initial));
        }

        // --- accepted results are within tolerance ---

        #[test]
        fn success_is_within_one_percent(
            base in 0u32..1_000,
            slope in 0u32..8,
        ) {
            let sim = Sim::new(&config(), 64, rising(base, slope));
            let mut calibrator = sim.calibrator(config());

            if let Ok(calibration) = calibrator.run_calibration() {
                prop_assert!(calibration.error_ms * 100 <= 500);
                prop_assert_eq!(calibration.error_ms, calibration.measured_ms.abs_diff(500));
            }
        }
    }
}
