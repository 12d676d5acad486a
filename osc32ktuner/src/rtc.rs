//! The real-time counter, clocked by OSC32K, as the time base being calibrated.


use atsaml21g18b::Peripherals;
use osccal::{DivisorCorrection, TickSource};


/// The nominal counting rate of the RTC (OSC32K's 1.024 kHz output, no prescaling).
pub const RTC_TICK_HZ: u32 = 1_024;


/// Converts RTC ticks into milliseconds.
pub const RTC_TICKS_TO_MS: DivisorCorrection = DivisorCorrection::new(1_000, RTC_TICK_HZ);


fn register_block() -> &'static atsaml21g18b::rtc::MODE0 {
    unsafe { (*atsaml21g18b::RTC::PTR).mode0() }
}


/// Enables the clocks for RTC.
pub(crate) fn enable_clock(peripherals: &mut Peripherals) {
    // enable CLK_RTC_APB
    peripherals.MCLK.apbamask.modify(|_, w| w
        .rtc_().set_bit()
    );

    // CLK_RTC_OSC is selected in OSC32KCTRL.RTCCTRL (see init)
}


/// Sets up RTC as a free-running counter.
pub(crate) fn setup_rtc(peripherals: &mut Peripherals) {
    enable_clock(peripherals);

    // raw frequency: 1_024 Hz (OSC32K/32)
    // no prescaling, no interrupts
    // 32-bit counter => wraps after ~48 days, only differences are evaluated anyway
    // => use RTC mode 0
    let register_block = register_block();

    // reset RTC
    register_block.ctrla.modify(|_, w| w
        .swrst().set_bit()
    );
    while register_block.syncbusy.read().swrst().bit_is_set() {
    }

    // basic configuration
    register_block.ctrla.modify(|_, w| w
        .mode().count32() // mode 0 (32-bit counter)
        .prescaler().div1() // count every tick of CLK_RTC_OSC
        .matchclr().clear_bit() // never clear on compare match
        .countsync().set_bit() // keep COUNT synchronized for continuous reading
        .enable().clear_bit() // don't start yet
    );
    while register_block.syncbusy.read().countsync().bit_is_set() {
    }

    // start
    register_block.ctrla.modify(|_, w| w
        .enable().set_bit()
    );
    while register_block.syncbusy.read().enable().bit_is_set() {
    }
}


/// Reads the RTC counter.
///
/// [`setup_rtc`] must have been called.
pub(crate) struct RtcTicks;
impl TickSource for RtcTicks {
    fn now(&mut self) -> u32 {
        let register_block = register_block();

        // COUNTSYNC keeps the value fresh, but a read must not race the next synchronization
        while register_block.syncbusy.read().count().bit_is_set() {
        }
        register_block.count.read().bits()
    }
}
