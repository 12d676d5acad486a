//! Measuring how long the device's time base takes for a number of reference cycles.


use embedded_hal::digital::InputPin;

use crate::config::DivisorCorrection;
use crate::edge::ClockEdgeWaiter;
use crate::hal::{Level, TickSource, TrimRegister};


/// Measures the duration of a fixed number of reference clock cycles on the device's time base.
///
/// Since the time base is driven by the oscillator being trimmed, a measurement longer than the
/// nominal duration means the oscillator runs fast, and vice versa.
pub struct DurationMeasurer<P, T, R> {
    waiter: ClockEdgeWaiter<P>,
    ticks: T,
    trim: R,
    correction: DivisorCorrection,
}
impl<P: InputPin, T: TickSource, R: TrimRegister> DurationMeasurer<P, T, R> {
    pub const fn new(waiter: ClockEdgeWaiter<P>, ticks: T, trim: R, correction: DivisorCorrection) -> Self {
        Self { waiter, ticks, trim, correction }
    }

    /// Counts `edge_flips` full reference cycles and returns the elapsed time in milliseconds.
    ///
    /// The count starts at a rising edge. Returns `None` if the reference signal stops
    /// transitioning at any point.
    pub fn measure(&mut self, edge_flips: u32) -> Option<u32> {
        if !self.waiter.wait_for_level(Level::High) {
            return None;
        }
        let start = self.ticks.now();

        for _ in 0..edge_flips {
            if !self.waiter.wait_for_level(Level::Low) {
                return None;
            }
            if !self.waiter.wait_for_level(Level::High) {
                return None;
            }
        }

        let elapsed = self.ticks.now().wrapping_sub(start);
        Some(self.correction.apply(elapsed))
    }

    /// Measures with `trim` applied to the trim register.
    ///
    /// The previously active trim value is restored before returning, whether or not the
    /// measurement succeeded.
    pub fn time_for_value(&mut self, trim: u8, edge_flips: u32) -> Option<u32> {
        let previous = self.trim.read();
        self.trim.write(trim);
        let measured = self.measure(edge_flips);
        self.trim.write(previous);
        measured
    }

    /// The trim register the measurer applies candidates to.
    pub fn trim_register(&mut self) -> &mut R {
        &mut self.trim
    }

    /// Gives back the hardware.
    pub fn release(self) -> (ClockEdgeWaiter<P>, T, R) {
        (self.waiter, self.ticks, self.trim)
    }
}
