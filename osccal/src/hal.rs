//! Hardware capabilities consumed by the calibration engine.
//!
//! The reference signal input is an [`embedded_hal::digital::InputPin`]; the remaining
//! capabilities have no counterpart in `embedded-hal` and are defined here.


/// Represents a digital input level.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logical low.
    Low,
    /// Logical high.
    High,
}
impl From<bool> for Level {
    fn from(val: bool) -> Self {
        match val {
            true => Self::High,
            false => Self::Low,
        }
    }
}
impl From<Level> for bool {
    fn from(level: Level) -> bool {
        match level {
            Level::Low => false,
            Level::High => true,
        }
    }
}
impl core::ops::Not for Level {
    type Output = Self;

    fn not(self) -> Self::Output {
        (!bool::from(self)).into()
    }
}


/// The oscillator trim register.
///
/// Writes must take effect immediately, i.e. before the next read of the [`TickSource`].
pub trait TrimRegister {
    /// Reads the currently active trim value.
    fn read(&mut self) -> u8;

    /// Makes `value` the active trim value.
    fn write(&mut self, value: u8);
}
impl<T: TrimRegister + ?Sized> TrimRegister for &mut T {
    #[inline]
    fn read(&mut self) -> u8 {
        T::read(self)
    }

    #[inline]
    fn write(&mut self, value: u8) {
        T::write(self, value)
    }
}


/// A monotonic time base driven by the oscillator being calibrated.
///
/// The counter is allowed to wrap; only differences between two readings are evaluated. Its unit
/// does not have to be milliseconds, the conversion is configured through
/// [`DivisorCorrection`](crate::config::DivisorCorrection).
pub trait TickSource {
    /// Returns the current counter value.
    fn now(&mut self) -> u32;
}
impl<T: TickSource + ?Sized> TickSource for &mut T {
    #[inline]
    fn now(&mut self) -> u32 {
        T::now(self)
    }
}
