use bytemuck::NoUninit;

use std::fmt;
use std::ops::*;

/// size in bytes
pub type ByteSize = usize;
/// offset in byte
pub type ByteOffset = isize;

/// Address represents an arbitrary address in the inspected process. This is designed to
/// represent address and do address arithmetic in a safe way. This type needs to be zero
/// overhead (memory wise and time wise).
///
/// Unlike a raw pointer, an `Address` can never be dereferenced through this crate. Frame
/// addresses handed out by the root enumerator may belong to a suspended thread or even to a
/// foreign process image, so loading from them is the caller's business.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Hash, PartialOrd, Ord, PartialEq, NoUninit)]
pub struct Address(usize);

static_assertions::assert_eq_size!(Address, usize);

// All address arithmetic wraps around, like the pointer arithmetic of compiled code.

/// Address + ByteSize (positive)
impl Add<ByteSize> for Address {
    type Output = Address;
    fn add(self, offset: ByteSize) -> Address {
        Address(self.0.wrapping_add(offset))
    }
}

/// Address += ByteSize (positive)
impl AddAssign<ByteSize> for Address {
    fn add_assign(&mut self, offset: ByteSize) {
        *self = *self + offset;
    }
}

/// Address + ByteOffset (positive or negative)
impl Add<ByteOffset> for Address {
    type Output = Address;
    fn add(self, offset: ByteOffset) -> Address {
        self.wrapping_offset(offset)
    }
}

/// Address - ByteSize (positive)
impl Sub<ByteSize> for Address {
    type Output = Address;
    fn sub(self, offset: ByteSize) -> Address {
        Address(self.0.wrapping_sub(offset))
    }
}

/// Address - Address, modulo the address space size
impl Sub<Address> for Address {
    type Output = ByteSize;
    fn sub(self, other: Address) -> ByteSize {
        self.0.wrapping_sub(other.0)
    }
}

impl Address {
    /// The lowest possible address.
    pub const ZERO: Self = Address(0);
    /// The highest possible address.
    pub const MAX: Self = Address(usize::MAX);

    /// creates an Address from a raw pointer-sized integer.
    ///
    /// Frame bases usually come from a stack walker that reads them out of another thread's
    /// registers or out of a core file, so there is nothing unsafe about making one up: an
    /// `Address` is never loaded from.
    pub const fn from_usize(raw: usize) -> Address {
        Address(raw)
    }

    /// Get the offset from `other` to `self`. The result is negative if `self` is lower than
    /// `other`.
    pub const fn get_offset(self, other: Address) -> ByteOffset {
        self.0.wrapping_sub(other.0) as isize
    }

    /// Offset the address by a signed number of bytes with two's complement wrap-around.
    ///
    /// This is the arithmetic compiled code performs on `[sp + disp]` operands; it never panics,
    /// even for garbage offsets read out of a corrupt image.
    pub const fn wrapping_offset(self, offset: ByteOffset) -> Address {
        Address(self.0.wrapping_add_signed(offset))
    }

    /// converts the Address to a pointer-sized integer
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// allows print Address as upper-case hex value
impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// allows print Address as lower-case hex value
impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// allows Display format the Address (as lower-case hex value with 0x prefix)
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// allows Debug format the Address (as lower-case hex value with 0x prefix)
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = std::num::ParseIntError;

    /// Accepts decimal, or hex with a `0x` prefix as printed by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => usize::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(Address(raw))
    }
}
