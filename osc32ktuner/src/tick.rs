//! A millisecond counter driven by SysTick, used for status signalling delays.
//!
//! SysTick runs from the core clock (OSC16M), not from the oscillator being calibrated.


use cortex_m::Peripherals;
use cortex_m_rt::exception;
use embedded_hal::delay::DelayNs;
use vcell::VolatileCell;

use crate::init::CORE_CLOCK_SPEED_HZ;


/// A volatile millisecond counter shared between the SysTick handler and the main loop.
#[repr(transparent)]
struct TickCounter {
    cell: VolatileCell<u32>,
}
impl TickCounter {
    const fn new() -> Self {
        Self { cell: VolatileCell::new(0) }
    }

    #[inline(always)]
    fn get(&self) -> u32 {
        self.cell.get()
    }

    #[inline(always)]
    fn increment(&self) {
        self.cell.set(self.cell.get().wrapping_add(1))
    }
}
// single core; only the SysTick handler writes
unsafe impl Sync for TickCounter {
}


static TICK_CLOCK: TickCounter = TickCounter::new();


#[exception]
fn SysTick() {
    TICK_CLOCK.increment()
}

pub fn enable_tick_clock(core_peripherals: &mut Peripherals) {
    const SYST_CSR_ENABLE_ENABLED: u32 = 1 << 0;
    const SYST_CSR_TICKINT_ENABLED: u32 = 1 << 1;
    const SYST_CSR_CLKSOURCE_MCK: u32 = 1 << 2;

    unsafe {
        core_peripherals.SYST.rvr.write(CORE_CLOCK_SPEED_HZ / 1000 - 1)
    };
    unsafe {
        core_peripherals.SYST.cvr.write(0)
    };
    unsafe {
        core_peripherals.SYST.csr.write(
            SYST_CSR_ENABLE_ENABLED
            | SYST_CSR_TICKINT_ENABLED
            | SYST_CSR_CLKSOURCE_MCK
        )
    };
}

#[inline]
pub fn delay_ms(ms: u32) {
    let start = TICK_CLOCK.get();
    while TICK_CLOCK.get().wrapping_sub(start) < ms {
        // nop
    }
}


/// [`DelayNs`] on top of the SysTick counter; resolution is one millisecond, rounding up.
pub(crate) struct TickDelay;
impl DelayNs for TickDelay {
    fn delay_ns(&mut self, ns: u32) {
        delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        delay_ms(ms);
    }
}
