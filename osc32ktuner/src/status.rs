//! Status signalling via the LED.


use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use osccal::CalibrationError;


const LONG_BLINK_MS: u32 = 800;
const SHORT_BLINK_MS: u32 = 150;
const RAPID_BLINK_MS: u32 = 50;
const PAUSE_MS: u32 = 600;


/// Something worth telling the person in front of the board.
#[derive(Clone, Copy, Debug, defmt::Format, Eq, Hash, PartialEq)]
pub(crate) enum Signal {
    /// A calibration attempt is about to start.
    Starting,

    /// The reference clock is not connected or not running.
    NoSignal,

    /// The oscillator cannot be trimmed close enough to the reference.
    ToleranceExceeded,

    /// Writing the result to NVM failed.
    StorageFailed,

    /// A new trim value has been stored.
    Calibrated,

    /// The firmware was built with an unusable calibration configuration.
    Misconfigured,
}
impl From<CalibrationError> for Signal {
    fn from(error: CalibrationError) -> Self {
        match error {
            CalibrationError::NoSignal => Self::NoSignal,
            CalibrationError::ToleranceExceeded { .. } => Self::ToleranceExceeded,
        }
    }
}
impl Signal {
    /// The number of blinks and their on/off time in milliseconds.
    const fn pattern(&self) -> (u8, u32) {
        match self {
            Self::Starting => (1, LONG_BLINK_MS),
            Self::NoSignal => (2, SHORT_BLINK_MS),
            Self::ToleranceExceeded => (3, SHORT_BLINK_MS),
            Self::StorageFailed => (5, RAPID_BLINK_MS),
            Self::Calibrated => (3, LONG_BLINK_MS),
            Self::Misconfigured => (10, RAPID_BLINK_MS),
        }
    }
}


/// An LED that blinks [`Signal`]s.
pub(crate) struct StatusLed<L, D> {
    led: L,
    delay: D,
}
impl<L: OutputPin, D: DelayNs> StatusLed<L, D> {
    pub fn new(led: L, delay: D) -> Self {
        Self { led, delay }
    }

    /// Blinks the pattern for `signal`, followed by a pause.
    pub fn show(&mut self, signal: Signal) {
        let (count, on_off_ms) = signal.pattern();
        for _ in 0..count {
            let _ = self.led.set_high();
            self.delay.delay_ms(on_off_ms);
            let _ = self.led.set_low();
            self.delay.delay_ms(on_off_ms);
        }
        self.delay.delay_ms(PAUSE_MS);
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
