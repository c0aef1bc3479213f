//! Translate decoded oop map values into the roots of one concrete frame.
//!
//! Given the frame base of a stopped frame, every stack location becomes an address and every
//! register location stays a register identifier. Nothing here reads memory: whether the frame
//! is still live, whether the addresses are mapped, and how to load a narrow oop are the
//! caller's business. That is what lets the same code serve a collector scanning its own
//! threads and a debugger reading a core file.

use std::fmt;

use crate::error::Result;
use crate::oop_map::{Location, OopMap, OopMapValue, ValueKind};
use crate::util::{Address, ByteOffset};
use crate::vm::{FrameConvention, Register, RegisterMap, RootVisitor};

/// A place that holds a root.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RootSlot {
    /// A stack slot.
    Memory(Address),
    /// A machine register. The caller needs architecture-specific code (or a
    /// [`RegisterMap`]) to get at it.
    Register(Register),
}

impl RootSlot {
    /// The address, if this is a memory slot.
    pub fn address(self) -> Option<Address> {
        match self {
            RootSlot::Memory(addr) => Some(addr),
            RootSlot::Register(_) => None,
        }
    }
}

impl fmt::Display for RootSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RootSlot::Memory(addr) => write!(f, "{}", addr),
            RootSlot::Register(reg) => write!(f, "{}", reg),
        }
    }
}

/// One root of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameRoot {
    /// `slot` holds a value of `kind`: a full or narrow reference, or a dead value.
    Reference {
        /// Where the value is.
        slot: RootSlot,
        /// [`ValueKind::Oop`], [`ValueKind::NarrowOop`] or [`ValueKind::Dead`].
        kind: ValueKind,
    },
    /// `slot` holds the caller's value of `register`.
    CalleeSaved {
        /// Where the register was spilled.
        slot: RootSlot,
        /// The register.
        register: Register,
    },
    /// A derived pointer whose base is in memory. `derived` is `base + offset`. If the collector
    /// moves the object referenced from `base`, it must recompute the pointer at `derived`.
    Derived {
        /// Slot holding the base reference.
        base: Address,
        /// Slot holding the derived pointer.
        derived: Address,
    },
    /// A derived pointer whose base is a register. No address can be computed for it here.
    DerivedInRegister {
        /// Register holding the base reference.
        base: Register,
        /// Offset of the derived pointer.
        offset: ByteOffset,
    },
}

impl FrameRoot {
    /// Translate one oop map value for the frame at `frame_base`.
    pub fn new(value: OopMapValue, frame_base: Address, convention: &FrameConvention) -> Self {
        let slot = |location: Location| match location {
            Location::Stack(offset) => {
                RootSlot::Memory(convention.slot_address(frame_base, offset))
            }
            Location::Register(reg) => RootSlot::Register(reg),
        };
        match value {
            OopMapValue::CalleeSaved { location, saved } => FrameRoot::CalleeSaved {
                slot: slot(location),
                register: saved,
            },
            OopMapValue::Derived { base, offset } => match slot(base) {
                RootSlot::Memory(base) => FrameRoot::Derived {
                    base,
                    derived: base.wrapping_offset(offset),
                },
                RootSlot::Register(base) => FrameRoot::DerivedInRegister { base, offset },
            },
            other => FrameRoot::Reference {
                slot: slot(other.location()),
                kind: other.kind(),
            },
        }
    }

    /// The kind of value this root came from.
    pub fn kind(&self) -> ValueKind {
        match self {
            FrameRoot::Reference { kind, .. } => *kind,
            FrameRoot::CalleeSaved { .. } => ValueKind::CalleeSaved,
            FrameRoot::Derived { .. } | FrameRoot::DerivedInRegister { .. } => ValueKind::Derived,
        }
    }

    /// The slot the root was recorded at; for a derived pointer, its base.
    pub fn slot(&self) -> RootSlot {
        match *self {
            FrameRoot::Reference { slot, .. } | FrameRoot::CalleeSaved { slot, .. } => slot,
            FrameRoot::Derived { base, .. } => RootSlot::Memory(base),
            FrameRoot::DerivedInRegister { base, .. } => RootSlot::Register(base),
        }
    }

    /// Replace register slots with the stack slots `register_map` says they were spilled to
    /// by a callee. Roots in registers the map does not know are returned unchanged.
    pub fn resolve(self, register_map: &RegisterMap) -> Self {
        match self {
            FrameRoot::Reference { slot, kind } => FrameRoot::Reference {
                slot: register_map.resolve(slot),
                kind,
            },
            FrameRoot::CalleeSaved { slot, register } => FrameRoot::CalleeSaved {
                slot: register_map.resolve(slot),
                register,
            },
            FrameRoot::DerivedInRegister { base, offset } => match register_map.location(base) {
                Some(base) => FrameRoot::Derived {
                    base,
                    derived: base.wrapping_offset(offset),
                },
                None => self,
            },
            derived @ FrameRoot::Derived { .. } => derived,
        }
    }
}

impl fmt::Display for FrameRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameRoot::Reference { slot, kind } => write!(f, "({}, {})", slot, kind),
            FrameRoot::CalleeSaved { slot, register } => {
                write!(f, "({}, {} saved {})", slot, ValueKind::CalleeSaved, register)
            }
            FrameRoot::Derived { base, derived } => {
                write!(f, "(base={}, derived={})", base, derived)
            }
            FrameRoot::DerivedInRegister { base, offset } => {
                write!(f, "(base={}, derived={}{:+})", base, base, offset)
            }
        }
    }
}

/// Roots of one frame, produced lazily from a sequence of decoded values.
#[derive(Debug, Clone)]
pub struct FrameRoots<I> {
    values: I,
    frame_base: Address,
    convention: FrameConvention,
}

impl<I: Iterator<Item = Result<OopMapValue>>> Iterator for FrameRoots<I> {
    type Item = Result<FrameRoot>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.values.next()?;
        Some(value.map(|value| FrameRoot::new(value, self.frame_base, &self.convention)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

/// Turn decoded values into roots of the frame at `frame_base`, in the values' order.
///
/// Decoding errors are passed through. A caller that needs all or nothing should use
/// [`collect_roots`] or [`scan_frame`].
pub fn enumerate<I>(
    frame_base: Address,
    values: I,
    convention: FrameConvention,
) -> FrameRoots<I::IntoIter>
where
    I: IntoIterator<Item = Result<OopMapValue>>,
{
    FrameRoots {
        values: values.into_iter(),
        frame_base,
        convention,
    }
}

/// Every root `map` describes for the frame at `frame_base`.
///
/// # Errors
/// The first decoding error. No roots are returned in that case: a partial root set is of no
/// use to a collector.
pub fn collect_roots(
    map: &OopMap,
    frame_base: Address,
    convention: FrameConvention,
) -> Result<Vec<FrameRoot>> {
    enumerate(frame_base, map.iter(), convention).collect()
}

/// Report every root of the frame at `frame_base` to `visitor`, resolving register roots through
/// `register_map` when one is given. Returns the number of roots reported.
///
/// The whole map is decoded before the visitor sees anything, so on error the visitor has not
/// been called at all.
///
/// # Errors
/// The first decoding error.
pub fn scan_frame<V: RootVisitor>(
    map: &OopMap,
    frame_base: Address,
    convention: FrameConvention,
    register_map: Option<&RegisterMap>,
    visitor: &mut V,
) -> Result<usize> {
    let roots = collect_roots(map, frame_base, convention)?;
    debug!(
        "scanning {} roots of the frame at {} (pc offset {:#x})",
        roots.len(),
        frame_base,
        map.pc_offset()
    );
    for root in &roots {
        let root = match register_map {
            Some(register_map) => root.resolve(register_map),
            None => *root,
        };
        trace!("root {}", root);
        visitor.visit_root(root);
    }
    Ok(roots.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oop_map::OopMapBuf;
    use crate::Error;

    fn reg(n: u16) -> Register {
        Register::new(n)
    }

    #[test]
    fn frame_root_translation() {
        let base = Address::from_usize(0x1000);
        let conv = FrameConvention::BYTES;
        assert_eq!(
            FrameRoot::new(OopMapValue::Oop(Location::Stack(8)), base, &conv),
            FrameRoot::Reference {
                slot: RootSlot::Memory(Address::from_usize(0x1008)),
                kind: ValueKind::Oop
            }
        );
        assert_eq!(
            FrameRoot::new(OopMapValue::Dead(Location::Register(reg(2))), base, &conv),
            FrameRoot::Reference {
                slot: RootSlot::Register(reg(2)),
                kind: ValueKind::Dead
            }
        );
        assert_eq!(
            FrameRoot::new(
                OopMapValue::CalleeSaved {
                    location: Location::Stack(-8),
                    saved: reg(12)
                },
                base,
                &conv
            ),
            FrameRoot::CalleeSaved {
                slot: RootSlot::Memory(Address::from_usize(0xff8)),
                register: reg(12)
            }
        );
        assert_eq!(
            FrameRoot::new(
                OopMapValue::Derived {
                    base: Location::Register(reg(5)),
                    offset: -16
                },
                base,
                &conv
            ),
            FrameRoot::DerivedInRegister {
                base: reg(5),
                offset: -16
            }
        );
    }

    #[test]
    fn accessors_and_display() {
        let root = FrameRoot::Derived {
            base: Address::from_usize(0x2018),
            derived: Address::from_usize(0x201c),
        };
        assert_eq!(root.kind(), ValueKind::Derived);
        assert_eq!(root.slot(), RootSlot::Memory(Address::from_usize(0x2018)));
        assert_eq!(root.to_string(), "(base=0x2018, derived=0x201c)");

        let root = FrameRoot::Reference {
            slot: RootSlot::Register(reg(3)),
            kind: ValueKind::Oop,
        };
        assert_eq!(root.to_string(), "(R3, Oop)");
        assert_eq!(root.slot().address(), None);
    }

    #[test]
    fn errors_pass_through() {
        let data = [0x00, 0x10, 0x0f];
        let map = OopMap::new(0, 2, &data);
        let mut roots = enumerate(
            Address::from_usize(0x1000),
            map.iter(),
            FrameConvention::BYTES,
        );
        assert!(roots.next().unwrap().is_ok());
        assert_eq!(
            roots.next(),
            Some(Err(Error::UnknownValueKind { tag: 0x0f, offset: 2 }))
        );
        assert_eq!(roots.next(), None);
        let base = Address::from_usize(0x1000);
        assert!(collect_roots(&map, base, FrameConvention::BYTES).is_err());
    }

    #[test]
    fn scan_frame_is_all_or_nothing() {
        let data = [0x00, 0x10, 0x00, 0x90];
        let map = OopMap::new(0, 2, &data);
        let mut seen = vec![];
        let result = scan_frame(
            &map,
            Address::from_usize(0x1000),
            FrameConvention::BYTES,
            None,
            &mut |root| seen.push(root),
        );
        assert_eq!(result, Err(Error::MalformedEncoding { offset: 3 }));
        assert!(seen.is_empty());
    }

    #[test]
    fn scan_frame_resolves_registers() {
        let buf = OopMapBuf::from_values(
            0x20,
            [
                OopMapValue::Oop(Location::Register(reg(3))),
                OopMapValue::Oop(Location::Register(reg(4))),
                OopMapValue::Derived {
                    base: Location::Register(reg(3)),
                    offset: 8,
                },
            ],
        );
        let mut register_map = RegisterMap::new();
        register_map.set_location(reg(3), Address::from_usize(0x5000));

        let mut seen = vec![];
        let count = scan_frame(
            &buf.as_oop_map(),
            Address::from_usize(0x1000),
            FrameConvention::BYTES,
            Some(&register_map),
            &mut |root| seen.push(root),
        )
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            seen,
            vec![
                FrameRoot::Reference {
                    slot: RootSlot::Memory(Address::from_usize(0x5000)),
                    kind: ValueKind::Oop
                },
                FrameRoot::Reference {
                    slot: RootSlot::Register(reg(4)),
                    kind: ValueKind::Oop
                },
                FrameRoot::Derived {
                    base: Address::from_usize(0x5000),
                    derived: Address::from_usize(0x5008)
                },
            ]
        );
    }
}
