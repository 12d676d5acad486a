//! Individual pins of PORT group A.


use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};


fn group_a() -> &'static atsaml21g18b::port::GROUP {
    unsafe { &(*atsaml21g18b::PORT::PTR).group[0] }
}


/// Pin PA`N` configured as a digital input.
pub(crate) struct InputLine<const N: u8>;
impl<const N: u8> InputLine<N> {
    const MASK: u32 = 1 << N;

    /// Switches the pin to input mode without pull resistor.
    ///
    /// The input buffer is enabled permanently (not on demand) so every read of `IN` reflects the
    /// current level.
    pub fn new() -> Self {
        let group = group_a();
        unsafe {
            group.dirclr.write(|w| w.bits(Self::MASK))
        };
        group.pincfg[usize::from(N)].modify(|_, w| w
            .pmuxen().clear_bit() // not handed over to a peripheral
            .inen().set_bit() // input buffer on
            .pullen().clear_bit() // the reference drives the line
        );
        group.ctrl.modify(|r, w| unsafe { w
            .sampling().bits(r.sampling().bits() | Self::MASK) // continuous sampling
        });
        Self
    }
}
impl<const N: u8> ErrorType for InputLine<N> {
    type Error = Infallible;
}
impl<const N: u8> InputPin for InputLine<N> {
    #[inline]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(group_a().in_.read().bits() & Self::MASK != 0)
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(group_a().in_.read().bits() & Self::MASK == 0)
    }
}


/// Pin PA`N` configured as a push-pull output.
pub(crate) struct OutputLine<const N: u8>;
impl<const N: u8> OutputLine<N> {
    const MASK: u32 = 1 << N;

    /// Switches the pin to output mode, driving it low.
    pub fn new() -> Self {
        let group = group_a();
        group.pincfg[usize::from(N)].modify(|_, w| w
            .pmuxen().clear_bit()
            .inen().clear_bit()
            .pullen().clear_bit()
        );
        unsafe {
            group.outclr.write(|w| w.bits(Self::MASK));
            group.dirset.write(|w| w.bits(Self::MASK));
        }
        Self
    }
}
impl<const N: u8> ErrorType for OutputLine<N> {
    type Error = Infallible;
}
impl<const N: u8> OutputPin for OutputLine<N> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        unsafe {
            group_a().outclr.write(|w| w.bits(Self::MASK))
        };
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        unsafe {
            group_a().outset.write(|w| w.bits(Self::MASK))
        };
        Ok(())
    }
}
