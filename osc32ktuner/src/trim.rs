//! The OSC32K internal oscillator calibration field as the trim register.


use osccal::TrimRegister;


fn read_calibration_area() -> u32 {
    // SAM L21 datasheet, § 11.4
    let calibration_area_ptr = 0x0080_6020 as *const u32;
    unsafe { core::ptr::read_volatile(calibration_area_ptr) }
}


/// The factory calibration value of the 32kHz internal oscillator.
///
/// Bits 12:6 of the NVM software calibration area; the reset value of `OSC32KCTRL.osc32k.calib`
/// is not trimmed, so this has to be stored there during initialization.
pub(crate) fn factory_osc32k() -> u8 {
    ((read_calibration_area() >> 6) & 0b111_1111) as u8
}


/// `OSC32KCTRL.osc32k.calib`.
///
/// The oscillator picks up a new value without having to be restarted.
pub(crate) struct Osc32kTrim;
impl Osc32kTrim {
    fn register_block() -> &'static atsaml21g18b::osc32kctrl::RegisterBlock {
        unsafe { &*atsaml21g18b::OSC32KCTRL::PTR }
    }
}
impl TrimRegister for Osc32kTrim {
    fn read(&mut self) -> u8 {
        Self::register_block().osc32k.read().calib().bits()
    }

    fn write(&mut self, value: u8) {
        Self::register_block().osc32k.modify(|_, w| unsafe { w
            .calib().bits(value & 0b111_1111) // 7-bit field
        });
    }
}
