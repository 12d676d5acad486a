//! Bounded waiting for a level on the reference clock input.


use embedded_hal::digital::InputPin;

use crate::hal::Level;


/// Polls the reference clock input until it reaches a level or the poll budget runs out.
///
/// The budget is the only way a wait ends without observing the level; there is no external
/// cancellation. It therefore bounds the blocking time of every measurement even if the reference
/// signal is missing.
pub struct ClockEdgeWaiter<P> {
    pin: P,
    timeout: u32,
}
impl<P: InputPin> ClockEdgeWaiter<P> {
    /// Creates a waiter that polls `pin` at most `timeout` times per wait.
    pub const fn new(pin: P, timeout: u32) -> Self {
        Self { pin, timeout }
    }

    /// The number of polls granted to each wait.
    pub const fn timeout(&self) -> u32 {
        self.timeout
    }

    /// Waits until the reference input is at `level`.
    ///
    /// Returns `true` as soon as the level is observed and `false` once `timeout` polls have not
    /// observed it. A failed pin read counts as a poll that did not observe the level.
    pub fn wait_for_level(&mut self, level: Level) -> bool {
        for _ in 0..self.timeout {
            let reached = match level {
                Level::High => self.pin.is_high(),
                Level::Low => self.pin.is_low(),
            };
            if let Ok(true) = reached {
                return true;
            }
        }
        false
    }

    /// Gives back the reference input.
    pub fn release(self) -> P {
        self.pin
    }
}
