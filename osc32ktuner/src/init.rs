//! Initialization code.


use atsaml21g18b::Peripherals;
use osccal::CalibrationConfig;

use crate::rtc::RTC_TICKS_TO_MS;


/// The speed of the core clock, timed by OSC16M at its reset frequency.
pub const CORE_CLOCK_SPEED_HZ: u32 = 4_000_000;

/// The frequency of the reference square wave on PA16.
pub const REFERENCE_FREQUENCY_HZ: u32 = 1_000;

/// How long a single measurement counts reference cycles for.
pub const MEASUREMENT_DURATION_MS: u32 = 1_000;


/// The parameters of each calibration attempt.
///
/// One reference cycle per millisecond for one second gives a resolution of 0.1%.
pub const CALIBRATION: CalibrationConfig =
    CalibrationConfig::new(REFERENCE_FREQUENCY_HZ, CORE_CLOCK_SPEED_HZ, MEASUREMENT_DURATION_MS)
        .with_divisor_correction(RTC_TICKS_TO_MS);

const _: () = assert!(matches!(CALIBRATION.validate(), Ok(())));


/// Sets up the microcontroller's clocks that will be used.
///
/// The following clock setup is used by `osc32ktuner`:
///
/// ```text
/// ┌────────┐                                  ┌────────┐
/// │ OSC16M │                                  │ CPU    │
/// │ 4 MHz  ├──────────────────────────────────┤ 4 MHz  │
/// └────────┘                                  └────────┘
///
/// ┌─────────────────────┐                     ┌─────────────────────┐
/// │ OSC32K (trimmed)    │                     │ RTC (time base)     │
/// │ 1.024 kHz output    ├─────────────────────┤ raw: 1.024 kHz      │
/// └─────────────────────┘                     │ prescaler: 1        │
///                                             └─────────────────────┘
/// ```
///
/// The core clock only governs how fast the reference input is polled, so the untrimmed OSC16M
/// is good enough; the RTC is what the calibration compares against the reference.
pub(crate) fn setup_clocks(peripherals: &mut Peripherals, initial_trim: u8) {
    // OSC16M comes out of reset enabled at 4 MHz and is already connected to GCG0 and the core

    // configure OSC32K with its starting trim value
    peripherals.OSC32KCTRL.osc32k.modify(|_, w| unsafe { w
        .ondemand().clear_bit() // run even if not explicitly requested
        .runstdby().set_bit() // run in standby mode too
        .en32k().set_bit() // enable 32kHz output
        .en1k().set_bit() // enable 1kHz output (feeds the RTC)
        .calib().bits(initial_trim & 0b111_1111)
    });

    // start OSC32K
    peripherals.OSC32KCTRL.osc32k.modify(|_, w| w
        .enable().set_bit()
    );
    while peripherals.OSC32KCTRL.status.read().osc32krdy().bit_is_clear() {
    }

    // feed CLK_RTC_OSC from OSC32K's 1.024 kHz output
    peripherals.OSC32KCTRL.rtcctrl.modify(|_, w| w
        .rtcsel().osc1k()
    );
}


/// Sets up the pins.
///
/// * PA16 = input (reference clock)
/// * PA27 = output (LED)
///
/// The pins themselves are handed out as [`InputLine`](crate::pin::InputLine) and
/// [`OutputLine`](crate::pin::OutputLine), whose constructors perform the configuration.
pub(crate) fn enable_port_clock(peripherals: &mut Peripherals) {
    // CLK_PORT_APB is enabled out of reset, but don't rely on it
    peripherals.MCLK.apbbmask.modify(|_, w| w
        .port_().set_bit()
    );
}


/// Performs microcontroller initialization.
///
/// `initial_trim` becomes the OSC32K calibration value that is active whenever no calibration
/// candidate is being measured.
pub(crate) fn initialize_microcontroller(peripherals: &mut Peripherals, initial_trim: u8) {
    // at 4 MHz, PL0 and zero flash wait states are enough (datasheet table 46-41)

    setup_clocks(peripherals, initial_trim);
    enable_port_clock(peripherals);
    crate::rtc::setup_rtc(peripherals);
}
