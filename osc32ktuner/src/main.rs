#![no_std]
#![no_main]


mod init;
mod nvm;
mod pin;
mod rtc;
mod status;
mod tick;
mod trim;


use core::panic::PanicInfo;

use atsaml21g18b::Peripherals;
use cortex_m_rt::entry;
use defmt_rtt as _;
use embedded_hal::digital::OutputPin;
use osccal::{apply_stored, Calibrator, RedundantSlot, TrimRegister, TrimStorage};

use crate::init::CALIBRATION;
use crate::nvm::{NvmError, RwweeSlot};
use crate::pin::{InputLine, OutputLine};
use crate::rtc::RtcTicks;
use crate::status::{Signal, StatusLed};
use crate::tick::TickDelay;
use crate::trim::Osc32kTrim;


/// The reference clock input.
type ReferencePin = InputLine<16>;

/// The status LED.
type LedPin = OutputLine<27>;


/// How long to wait before trying again after a failed attempt.
const RETRY_DELAY_MS: u32 = 5_000;


#[inline]
fn noppage() {
    for _ in 0..65536 {
        cortex_m::asm::nop();
    }
}


#[panic_handler]
fn panicked(_reason: &PanicInfo) -> ! {
    // the LED pin may not have been configured yet
    let mut led = LedPin::new();

    loop {
        let _ = led.set_high();
        noppage();
        let _ = led.set_low();
        noppage();
    }
}


/// Stores `trim` and reads it back.
fn store_verified<S: TrimStorage<Error = NvmError>>(storage: &mut S, trim: u8) -> Result<(), NvmError> {
    storage.store(trim)?;
    let stored = storage.load()?;
    if stored.valid && stored.value == trim {
        Ok(())
    } else {
        Err(NvmError::VerifyFailed)
    }
}


#[entry]
fn main() -> ! {
    let mut peripherals = Peripherals::take()
        .expect("peripherals already taken?!");
    let mut core_peripherals = cortex_m::Peripherals::take()
        .expect("core peripherals already taken?!");

    let factory_trim = crate::trim::factory_osc32k();
    crate::init::initialize_microcontroller(&mut peripherals, factory_trim);
    crate::tick::enable_tick_clock(&mut core_peripherals);

    let mut status = StatusLed::new(LedPin::new(), TickDelay);
    let mut storage = RedundantSlot::new(RwweeSlot);

    // start from the previous calibration if there is one
    let mut trim_register = Osc32kTrim;
    match apply_stored(&mut storage, &mut trim_register) {
        Ok(Some(stored)) => defmt::info!("starting from stored trim {=u8}", stored),
        Ok(None) => defmt::info!("starting from factory trim {=u8}", factory_trim),
        Err(e) => defmt::warn!("reading stored trim failed: {}", e),
    }

    let mut calibrator = match Calibrator::from_parts(ReferencePin::new(), RtcTicks, trim_register, CALIBRATION) {
        Ok(calibrator) => calibrator,
        Err(e) => {
            defmt::error!("unusable calibration configuration: {}", e);
            loop {
                status.show(Signal::Misconfigured);
            }
        },
    };

    loop {
        status.show(Signal::Starting);
        defmt::info!("calibrating against {=u32} Hz reference", CALIBRATION.reference_frequency_hz());

        match calibrator.run_calibration() {
            Ok(calibration) => {
                defmt::info!(
                    "trim {=u8}: {=u32} ms ({=u32} ms off)",
                    calibration.trim, calibration.measured_ms, calibration.error_ms,
                );
                match store_verified(&mut storage, calibration.trim) {
                    Ok(()) => {
                        calibrator.measurer().trim_register().write(calibration.trim);
                        status.show(Signal::Calibrated);
                        break;
                    },
                    Err(e) => {
                        defmt::error!("storing trim failed: {}", e);
                        status.show(Signal::StorageFailed);
                    },
                }
            },
            Err(e) => {
                defmt::warn!("calibration failed: {}", e);
                status.show(Signal::from(e));
            },
        }

        status.delay_ms(RETRY_DELAY_MS);
    }

    defmt::info!("done");
    loop {
        cortex_m::asm::wfi();
    }
}
