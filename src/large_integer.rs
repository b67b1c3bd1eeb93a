//! `LARGE_INTEGER` and `ULARGE_INTEGER`.
//!
//! In C both are unions of a `{ LowPart, HighPart }` struct and a 64-bit
//! `QuadPart`. Here each is a single 8-byte cell kept in little-endian order,
//! which is how Windows lays the union out, and the two views are computed
//! from it. `LowPart` is always the four bytes at offset 0.
#![allow(non_camel_case_types)]

use std::fmt;

use static_assertions::const_assert_eq;

use crate::types::{DWORD, LONG, LONGLONG, ULONGLONG};

/// Split view of a [`LargeInteger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LargeIntegerParts {
    pub low_part: DWORD,
    pub high_part: LONG,
}

/// Split view of a [`ULargeInteger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ULargeIntegerParts {
    pub low_part: DWORD,
    pub high_part: DWORD,
}

/// Signed 64-bit cell readable as two 32-bit halves or one `LONGLONG`.
#[repr(C, align(8))]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LargeInteger([u8; 8]);

impl LargeInteger {
    pub const fn new(quad_part: LONGLONG) -> Self {
        Self(quad_part.to_le_bytes())
    }

    pub const fn from_parts(low_part: DWORD, high_part: LONG) -> Self {
        let mut cell = Self([0; 8]);
        cell.set_low_part(low_part);
        cell.set_high_part(high_part);
        cell
    }

    pub const fn low_part(&self) -> DWORD {
        DWORD::from_le_bytes(low_bytes(&self.0))
    }

    pub const fn set_low_part(&mut self, low_part: DWORD) {
        store_low(&mut self.0, low_part.to_le_bytes());
    }

    pub const fn high_part(&self) -> LONG {
        LONG::from_le_bytes(high_bytes(&self.0))
    }

    pub const fn set_high_part(&mut self, high_part: LONG) {
        store_high(&mut self.0, high_part.to_le_bytes());
    }

    pub const fn parts(&self) -> LargeIntegerParts {
        LargeIntegerParts {
            low_part: self.low_part(),
            high_part: self.high_part(),
        }
    }

    pub const fn set_parts(&mut self, parts: LargeIntegerParts) {
        self.set_low_part(parts.low_part);
        self.set_high_part(parts.high_part);
    }

    pub const fn quad_part(&self) -> LONGLONG {
        LONGLONG::from_le_bytes(self.0)
    }

    pub const fn set_quad_part(&mut self, quad_part: LONGLONG) {
        self.0 = quad_part.to_le_bytes();
    }

    /// The cell exactly as it sits in memory.
    pub const fn to_le_bytes(self) -> [u8; 8] {
        self.0
    }

    pub const fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl From<LONGLONG> for LargeInteger {
    fn from(quad_part: LONGLONG) -> Self {
        Self::new(quad_part)
    }
}

impl From<LargeInteger> for LONGLONG {
    fn from(value: LargeInteger) -> Self {
        value.quad_part()
    }
}

impl From<LargeIntegerParts> for LargeInteger {
    fn from(parts: LargeIntegerParts) -> Self {
        Self::from_parts(parts.low_part, parts.high_part)
    }
}

impl fmt::Debug for LargeInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LargeInteger")
            .field("low_part", &format_args!("{:#010x}", self.low_part()))
            .field("high_part", &self.high_part())
            .field("quad_part", &self.quad_part())
            .finish()
    }
}

/// Unsigned 64-bit cell readable as two 32-bit halves or one `ULONGLONG`.
#[repr(C, align(8))]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ULargeInteger([u8; 8]);

impl ULargeInteger {
    pub const fn new(quad_part: ULONGLONG) -> Self {
        Self(quad_part.to_le_bytes())
    }

    pub const fn from_parts(low_part: DWORD, high_part: DWORD) -> Self {
        let mut cell = Self([0; 8]);
        cell.set_low_part(low_part);
        cell.set_high_part(high_part);
        cell
    }

    pub const fn low_part(&self) -> DWORD {
        DWORD::from_le_bytes(low_bytes(&self.0))
    }

    pub const fn set_low_part(&mut self, low_part: DWORD) {
        store_low(&mut self.0, low_part.to_le_bytes());
    }

    pub const fn high_part(&self) -> DWORD {
        DWORD::from_le_bytes(high_bytes(&self.0))
    }

    pub const fn set_high_part(&mut self, high_part: DWORD) {
        store_high(&mut self.0, high_part.to_le_bytes());
    }

    pub const fn parts(&self) -> ULargeIntegerParts {
        ULargeIntegerParts {
            low_part: self.low_part(),
            high_part: self.high_part(),
        }
    }

    pub const fn set_parts(&mut self, parts: ULargeIntegerParts) {
        self.set_low_part(parts.low_part);
        self.set_high_part(parts.high_part);
    }

    pub const fn quad_part(&self) -> ULONGLONG {
        ULONGLONG::from_le_bytes(self.0)
    }

    pub const fn set_quad_part(&mut self, quad_part: ULONGLONG) {
        self.0 = quad_part.to_le_bytes();
    }

    /// The cell exactly as it sits in memory.
    pub const fn to_le_bytes(self) -> [u8; 8] {
        self.0
    }

    pub const fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl From<ULONGLONG> for ULargeInteger {
    fn from(quad_part: ULONGLONG) -> Self {
        Self::new(quad_part)
    }
}

impl From<ULargeInteger> for ULONGLONG {
    fn from(value: ULargeInteger) -> Self {
        value.quad_part()
    }
}

impl From<ULargeIntegerParts> for ULargeInteger {
    fn from(parts: ULargeIntegerParts) -> Self {
        Self::from_parts(parts.low_part, parts.high_part)
    }
}

impl fmt::Debug for ULargeInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ULargeInteger")
            .field("low_part", &format_args!("{:#010x}", self.low_part()))
            .field("high_part", &format_args!("{:#010x}", self.high_part()))
            .field("quad_part", &self.quad_part())
            .finish()
    }
}

const fn low_bytes(cell: &[u8; 8]) -> [u8; 4] {
    [cell[0], cell[1], cell[2], cell[3]]
}

const fn high_bytes(cell: &[u8; 8]) -> [u8; 4] {
    [cell[4], cell[5], cell[6], cell[7]]
}

const fn store_low(cell: &mut [u8; 8], bytes: [u8; 4]) {
    cell[0] = bytes[0];
    cell[1] = bytes[1];
    cell[2] = bytes[2];
    cell[3] = bytes[3];
}

const fn store_high(cell: &mut [u8; 8], bytes: [u8; 4]) {
    cell[4] = bytes[0];
    cell[5] = bytes[1];
    cell[6] = bytes[2];
    cell[7] = bytes[3];
}

pub type LARGE_INTEGER = LargeInteger;
pub type ULARGE_INTEGER = ULargeInteger;

const_assert_eq!(size_of::<LargeInteger>(), 8);
const_assert_eq!(align_of::<LargeInteger>(), 8);
const_assert_eq!(size_of::<ULargeInteger>(), 8);
const_assert_eq!(align_of::<ULargeInteger>(), 8);
