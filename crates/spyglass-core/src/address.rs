//! Opaque addresses in the attached process's address space.
//!
//! Foreign addresses are plain 64-bit values on the wire, but they must never
//! be confused with host pointers or arbitrary integers. `Address` forces the
//! conversion to happen explicitly at the boundary and restricts arithmetic to
//! named offset methods.

use std::fmt;

/// An address in the foreign (attached) address space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address {
    /// The null foreign address. Never a legal module base.
    pub const NULL: Address = Address(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw 64-bit value.
    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Offsets forward by `offset` bytes, wrapping on overflow.
    #[must_use]
    pub const fn add(self, offset: u64) -> Address {
        Address(self.0.wrapping_add(offset))
    }

    /// Offsets forward by `offset` bytes, `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, offset: u64) -> Option<Address> {
        match self.0.checked_add(offset) {
            Some(value) => Some(Address(value)),
            None => None,
        }
    }

    /// Offsets by a signed byte delta, wrapping on overflow.
    #[must_use]
    pub const fn offset(self, delta: i64) -> Address {
        Address(self.0.wrapping_add_signed(delta))
    }

    /// Rounds down to a multiple of `align`. `align` must be a power of two.
    #[must_use]
    pub const fn align_down(self, align: u64) -> Address {
        Address(self.0 & !(align - 1))
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}
