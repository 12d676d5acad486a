//! Persisting a trim value in non-volatile memory.
//!
//! A trim value occupies a two-byte slot: the value itself, followed by its one's complement. A
//! slot is only considered valid if the second byte is still the inverse of the first, which
//! detects both corruption and slots that were never written (erased flash and EEPROM read as
//! `0xFF 0xFF`).


use crate::hal::TrimRegister;


/// A trim value read back from storage.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredTrim {
    pub value: u8,

    /// Whether the redundant copy matched.
    pub valid: bool,
}


/// Storage for a single trim value.
///
/// `store(v)` followed by `load()` must yield `StoredTrim { value: v, valid: true }`.
pub trait TrimStorage {
    type Error;

    fn store(&mut self, value: u8) -> Result<(), Self::Error>;

    fn load(&mut self) -> Result<StoredTrim, Self::Error>;
}


/// A raw two-byte slot of non-volatile memory.
pub trait ByteSlots {
    type Error;

    fn read_pair(&mut self) -> Result<[u8; 2], Self::Error>;

    fn write_pair(&mut self, pair: [u8; 2]) -> Result<(), Self::Error>;
}


/// The encoding of a trim value as the value and its one's complement.
pub struct RedundantByte;
impl RedundantByte {
    pub const fn encode(value: u8) -> [u8; 2] {
        [value, !value]
    }

    pub const fn decode(pair: [u8; 2]) -> StoredTrim {
        StoredTrim {
            value: pair[0],
            valid: pair[0] == !pair[1],
        }
    }
}


/// A [`TrimStorage`] that keeps the value redundantly in a [`ByteSlots`].
pub struct RedundantSlot<S> {
    slots: S,
}
impl<S: ByteSlots> RedundantSlot<S> {
    pub const fn new(slots: S) -> Self {
        Self { slots }
    }

    pub fn release(self) -> S {
        self.slots
    }
}
impl<S: ByteSlots> TrimStorage for RedundantSlot<S> {
    type Error = S::Error;

    fn store(&mut self, value: u8) -> Result<(), Self::Error> {
        self.slots.write_pair(RedundantByte::encode(value))
    }

    fn load(&mut self) -> Result<StoredTrim, Self::Error> {
        self.slots.read_pair()
            .map(RedundantByte::decode)
    }
}


/// Applies a previously stored trim value, if there is a valid one.
///
/// Returns the applied value; the trim register is left untouched if the slot is invalid.
pub fn apply_stored<S: TrimStorage, R: TrimRegister>(storage: &mut S, register: &mut R) -> Result<Option<u8>, S::Error> {
    let stored = storage.load()?;
    if !stored.valid {
        return Ok(None);
    }
    register.write(stored.value);
    Ok(Some(stored.value))
}
