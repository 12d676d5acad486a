//! Non-volatile storage of the trim value in the RWW EEPROM section.
//!
//! The RWWEE section can be programmed while code keeps executing from the main flash array. The
//! trim value occupies the first two bytes of its first row.


use core::fmt;

use osccal::ByteSlots;


/// Start of the RWWEE section (SAM L21 datasheet, § 27.6.4).
const RWWEE_BASE: u32 = 0x0040_0000;

/// Unlocks command execution when written into CTRLA.CMDEX.
const CMDEX_KEY: u16 = 0xA5 << 8;

const CMD_RWWEE_ERASE_ROW: u16 = 0x1A;
const CMD_RWWEE_WRITE_PAGE: u16 = 0x1C;
const CMD_PAGE_BUFFER_CLEAR: u16 = 0x44;
const CMD_INVALIDATE_CACHE: u16 = 0x46;

// STATUS bits that are cleared by writing a one
const STATUS_PROGE: u16 = 1 << 2;
const STATUS_LOCKE: u16 = 1 << 3;
const STATUS_NVME: u16 = 1 << 4;


/// An error reported by the NVM controller.
#[derive(Clone, Copy, Debug, defmt::Format, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NvmError {
    /// The command targeted a locked region.
    Locked,

    /// The command or its address was invalid.
    Programming,

    /// The controller reported an error while erasing or writing.
    Controller,

    /// The value read back after writing differs from what was written.
    VerifyFailed,
}
impl fmt::Display for NvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked
                => write!(f, "region locked"),
            Self::Programming
                => write!(f, "invalid command or address"),
            Self::Controller
                => write!(f, "erase or write failed"),
            Self::VerifyFailed
                => write!(f, "read-back mismatch"),
        }
    }
}


/// The first two bytes of the RWWEE section.
pub(crate) struct RwweeSlot;
impl RwweeSlot {
    fn register_block() -> &'static atsaml21g18b::nvmctrl::RegisterBlock {
        unsafe { &*atsaml21g18b::NVMCTRL::PTR }
    }

    fn wait_ready() {
        let register_block = Self::register_block();
        while register_block.intflag.read().ready().bit_is_clear() {
        }
    }

    /// Executes an NVM controller command on the row or page containing `address`.
    fn execute(command: u16, address: u32) -> Result<(), NvmError> {
        let register_block = Self::register_block();
        Self::wait_ready();

        // clear any stale error flags
        unsafe {
            register_block.status.write(|w| w.bits(STATUS_PROGE | STATUS_LOCKE | STATUS_NVME))
        };

        // ADDR holds the 16-bit word address
        unsafe {
            register_block.addr.write(|w| w.bits(address >> 1))
        };
        unsafe {
            register_block.ctrla.write(|w| w.bits(CMDEX_KEY | command))
        };
        Self::wait_ready();

        let status = register_block.status.read().bits();
        if status & STATUS_LOCKE != 0 {
            Err(NvmError::Locked)
        } else if status & STATUS_PROGE != 0 {
            Err(NvmError::Programming)
        } else if status & STATUS_NVME != 0 {
            Err(NvmError::Controller)
        } else {
            Ok(())
        }
    }
}
impl ByteSlots for RwweeSlot {
    type Error = NvmError;

    fn read_pair(&mut self) -> Result<[u8; 2], Self::Error> {
        Self::wait_ready();
        let halfword = unsafe { core::ptr::read_volatile(RWWEE_BASE as *const u16) };
        Ok(halfword.to_le_bytes())
    }

    fn write_pair(&mut self, pair: [u8; 2]) -> Result<(), Self::Error> {
        Self::execute(CMD_RWWEE_ERASE_ROW, RWWEE_BASE)?;
        Self::execute(CMD_PAGE_BUFFER_CLEAR, RWWEE_BASE)?;

        // the page buffer only accepts 16- and 32-bit writes; the rest of the page stays erased
        let word = u32::from(u16::from_le_bytes(pair)) | 0xFFFF_0000;
        unsafe { core::ptr::write_volatile(RWWEE_BASE as *mut u32, word) };

        Self::execute(CMD_RWWEE_WRITE_PAGE, RWWEE_BASE)?;
        Self::execute(CMD_INVALIDATE_CACHE, RWWEE_BASE)
    }
}
