//! Machine register identifiers as they appear in oop maps.

use std::fmt;

/// A register named by an oop map.
///
/// The numbering is the compiler backend's own and only meaningful together with a target
/// description. This crate never interprets the number; a root living in a register has to be
/// handled by architecture-specific code in the caller, or resolved through a
/// [`crate::RegisterMap`] to the stack slot the register was spilled to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u16);

impl Register {
    /// Register number `number`.
    pub const fn new(number: u16) -> Self {
        Register(number)
    }

    /// The backend's register number.
    pub const fn number(self) -> u16 {
        self.0
    }
}

impl From<u16> for Register {
    fn from(number: u16) -> Self {
        Register(number)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
