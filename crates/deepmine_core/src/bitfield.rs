//! # BitField Store
//!
//! A 256-bit word in which disjoint bit ranges encode independent
//! sub-fields: timestamps, counters, enums, flags. This is the single
//! storage primitive behind every token type - the packing layouts defined
//! by the token and mining engines are the wire format of the whole system
//! and must never drift.
//!
//! ## Contract
//!
//! - `read` returns bits `[offset, offset + length)` right-aligned
//! - `write` clears exactly `length` bits at `offset`, then ORs in the
//!   value truncated to `length` bits; every other bit is byte-for-byte
//!   unchanged
//! - `length == 0` is a sentinel meaning the whole word
//! - a window past bit 255 is rejected, never wrapped

use alloy_primitives::U256;

use crate::error::{EngineError, EngineResult};

/// Width of a packed word in bits.
pub const WORD_BITS: u32 = 256;

/// A 256-bit packed-attribute word.
///
/// Pure value type: `read` and `write` have no side effects beyond the
/// returned word; callers persist the result themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PackedWord(U256);

impl PackedWord {
    /// The all-zero word.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Wraps a raw 256-bit value.
    #[inline]
    #[must_use]
    pub const fn new(raw: U256) -> Self {
        Self(raw)
    }

    /// Returns the raw 256-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// Reads bits `[offset, offset + length)`, right-aligned.
    ///
    /// `length == 0` returns the full word unmasked.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the window would exceed bit 255.
    pub fn read(self, offset: u32, length: u32) -> EngineResult<U256> {
        if length == 0 {
            return Ok(self.0);
        }
        check_window(offset, length)?;
        Ok((self.0 >> (offset as usize)) & window_mask(length))
    }

    /// Writes `value` into bits `[offset, offset + length)` and returns the
    /// new word. Bits of `value` above `length` are silently discarded.
    ///
    /// `length == 0` replaces the whole word (mirror of the read sentinel).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the window would exceed bit 255.
    pub fn write(self, value: U256, offset: u32, length: u32) -> EngineResult<Self> {
        if length == 0 {
            return Ok(Self(value));
        }
        check_window(offset, length)?;
        let mask = window_mask(length);
        let cleared = self.0 & !(mask << (offset as usize));
        Ok(Self(cleared | ((value & mask) << (offset as usize))))
    }

    /// Reads a window of at most 64 bits as a `u64`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `length` is zero, wider than 64 bits, or the
    /// window would exceed bit 255.
    pub fn read_u64(self, offset: u32, length: u32) -> EngineResult<u64> {
        if length == 0 || length > 64 {
            return Err(EngineError::InvalidArgument(format!(
                "u64 window must be 1..=64 bits, got {length}"
            )));
        }
        Ok(self.read(offset, length)?.as_limbs()[0])
    }

    /// Writes a `u64` into a window of at most 64 bits.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `length` is zero, wider than 64 bits, or the
    /// window would exceed bit 255.
    pub fn write_u64(self, value: u64, offset: u32, length: u32) -> EngineResult<Self> {
        if length == 0 || length > 64 {
            return Err(EngineError::InvalidArgument(format!(
                "u64 window must be 1..=64 bits, got {length}"
            )));
        }
        self.write(U256::from(value), offset, length)
    }
}

impl From<U256> for PackedWord {
    #[inline]
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl From<PackedWord> for U256 {
    #[inline]
    fn from(word: PackedWord) -> Self {
        word.0
    }
}

/// Mask with the low `length` bits set. `length` must be 1..=256.
fn window_mask(length: u32) -> U256 {
    if length >= WORD_BITS {
        U256::MAX
    } else {
        (U256::from(1u8) << (length as usize)) - U256::from(1u8)
    }
}

/// Rejects windows reaching past bit 255.
fn check_window(offset: u32, length: u32) -> EngineResult<()> {
    if offset.checked_add(length).is_none() || offset + length > WORD_BITS {
        return Err(EngineError::InvalidArgument(format!(
            "bit window [{offset}, {offset}+{length}) exceeds {WORD_BITS} bits"
        )));
    }
    Ok(())
}
