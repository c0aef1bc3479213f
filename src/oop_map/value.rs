//! Oop map values: one decoded entry of an oop map, and its encoding.
//!
//! Each value is encoded as a tag byte followed by one or two compressed integers:
//!
//! ```text
//! tag:      bit 7     location is a register (else a stack slot)
//!           bits 3-6  reserved, must be zero
//!           bits 0-2  ValueKind
//! location: zig-zag stack offset, or unsigned register number
//! extra:    CalleeSaved -> unsigned number of the register saved at `location`
//!           Derived     -> zig-zag offset of the derived pointer from its base
//! ```

use std::fmt;

use enum_map::Enum;
use strum_macros::{Display, EnumCount, EnumIter, FromRepr};

use crate::error::{Error, Result};
use crate::util::compressed_stream::{CompressedReadStream, CompressedWriteStream};
use crate::util::ByteOffset;
use crate::vm::Register;

const KIND_MASK: u8 = 0b0000_0111;
const RESERVED_MASK: u8 = 0b0111_1000;
const REGISTER_LOCATION: u8 = 0b1000_0000;

/// What a location holds at the safepoint.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Enum, EnumIter, EnumCount, Display, FromRepr)]
pub enum ValueKind {
    /// A full-width reference.
    Oop = 0,
    /// A compressed reference (narrow oop). The collector must decode it with the heap's
    /// compression base and shift.
    NarrowOop = 1,
    /// The location holds the caller's value of a callee-saved register, not a root by itself.
    CalleeSaved = 2,
    /// An interior pointer computed from a base reference.
    Derived = 3,
    /// A location the compiler knows to be dead. Never a root.
    Dead = 4,
}

impl ValueKind {
    /// Does a location of this kind hold a reference the collector must trace?
    pub const fn is_reference(self) -> bool {
        matches!(self, ValueKind::Oop | ValueKind::NarrowOop | ValueKind::Derived)
    }
}

/// Where a value lives in a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// A stack slot at a signed offset from the frame base, in the units of the target's
    /// [`crate::FrameConvention`].
    Stack(ByteOffset),
    /// A machine register.
    Register(Register),
}

impl Location {
    fn write_to(self, stream: &mut CompressedWriteStream) {
        match self {
            Location::Stack(offset) => stream.write_int(offset as i64),
            Location::Register(reg) => stream.write_uint(u64::from(reg.number())),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Stack(offset) => write!(f, "stack[{}]", offset),
            Location::Register(reg) => write!(f, "{}", reg),
        }
    }
}

/// One entry of an oop map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OopMapValue {
    /// `location` holds a full-width reference.
    Oop(Location),
    /// `location` holds a narrow (compressed) reference.
    NarrowOop(Location),
    /// `location` holds the value `saved` had in the caller.
    CalleeSaved {
        /// Where the value was spilled.
        location: Location,
        /// The register whose value it is.
        saved: Register,
    },
    /// A derived pointer: `base` holds a reference, and the derived value is `base + offset`.
    /// When the collector moves the base object it must recompute the derived pointer.
    Derived {
        /// Location of the base reference.
        base: Location,
        /// Byte offset of the derived pointer from the base.
        offset: ByteOffset,
    },
    /// `location` is dead at this pc.
    Dead(Location),
}

impl OopMapValue {
    /// The kind tag of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            OopMapValue::Oop(_) => ValueKind::Oop,
            OopMapValue::NarrowOop(_) => ValueKind::NarrowOop,
            OopMapValue::CalleeSaved { .. } => ValueKind::CalleeSaved,
            OopMapValue::Derived { .. } => ValueKind::Derived,
            OopMapValue::Dead(_) => ValueKind::Dead,
        }
    }

    /// The location the entry describes. For a derived pointer this is the base.
    pub const fn location(&self) -> Location {
        match *self {
            OopMapValue::Oop(location)
            | OopMapValue::NarrowOop(location)
            | OopMapValue::CalleeSaved { location, .. }
            | OopMapValue::Derived { base: location, .. }
            | OopMapValue::Dead(location) => location,
        }
    }

    /// Append the encoding of this value to `stream`.
    pub fn write_to(&self, stream: &mut CompressedWriteStream) {
        let location = self.location();
        let mut tag = self.kind() as u8;
        if matches!(location, Location::Register(_)) {
            tag |= REGISTER_LOCATION;
        }
        stream.write_u8(tag);
        location.write_to(stream);
        match *self {
            OopMapValue::CalleeSaved { saved, .. } => stream.write_uint(u64::from(saved.number())),
            OopMapValue::Derived { offset, .. } => stream.write_int(offset as i64),
            _ => {}
        }
    }

    /// Decode one value from `stream`.
    ///
    /// # Errors
    /// - [`Error::UnknownValueKind`] for a tag with reserved bits set or an unknown kind.
    /// - [`Error::MalformedEncoding`] if a field is cut short. A field that would start exactly
    ///   at the end of the buffer reports the buffer length as its offset, which is how the
    ///   table decoder tells a truncated table from a broken integer.
    /// - [`Error::ValueOutOfRange`] if a register number or offset does not fit.
    pub fn read_from(stream: &mut CompressedReadStream) -> Result<Self> {
        let tag_offset = stream.position();
        let tag = stream.read_u8()?;
        let unknown = Error::UnknownValueKind {
            tag,
            offset: tag_offset,
        };
        if tag & RESERVED_MASK != 0 {
            return Err(unknown);
        }
        let kind = ValueKind::from_repr(tag & KIND_MASK).ok_or(unknown)?;

        let location = if tag & REGISTER_LOCATION != 0 {
            Location::Register(read_register(stream)?)
        } else {
            Location::Stack(read_offset(stream)?)
        };

        Ok(match kind {
            ValueKind::Oop => OopMapValue::Oop(location),
            ValueKind::NarrowOop => OopMapValue::NarrowOop(location),
            ValueKind::CalleeSaved => OopMapValue::CalleeSaved {
                location,
                saved: read_register(stream)?,
            },
            ValueKind::Derived => OopMapValue::Derived {
                base: location,
                offset: read_offset(stream)?,
            },
            ValueKind::Dead => OopMapValue::Dead(location),
        })
    }
}

fn read_register(stream: &mut CompressedReadStream) -> Result<Register> {
    let offset = stream.position();
    let raw = stream.read_uint()?;
    u16::try_from(raw)
        .map(Register::new)
        .map_err(|_| Error::ValueOutOfRange { offset })
}

fn read_offset(stream: &mut CompressedReadStream) -> Result<ByteOffset> {
    let offset = stream.position();
    let raw = stream.read_int()?;
    ByteOffset::try_from(raw).map_err(|_| Error::ValueOutOfRange { offset })
}

impl fmt::Display for OopMapValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OopMapValue::CalleeSaved { location, saved } => {
                write!(f, "CalleeSaved({}={})", location, saved)
            }
            OopMapValue::Derived { base, offset } => write!(f, "Derived({}{:+})", base, offset),
            other => write!(f, "{}({})", other.kind(), other.location()),
        }
    }
}

/// A set of [`ValueKind`]s, used to select the entries a consumer cares about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KindMask(u8);

impl KindMask {
    /// Every kind.
    pub const ALL: KindMask = KindMask((1 << <ValueKind as strum::EnumCount>::COUNT) - 1);
    /// No kind.
    pub const NONE: KindMask = KindMask(0);
    /// Full-width and narrow references: what a non-moving root scan needs.
    pub const OOPS: KindMask = KindMask::NONE.with(ValueKind::Oop).with(ValueKind::NarrowOop);

    /// Add `kind` to the set.
    pub const fn with(self, kind: ValueKind) -> KindMask {
        KindMask(self.0 | (1 << kind as u8))
    }

    /// Build a set from a list of kinds.
    pub fn of(kinds: &[ValueKind]) -> KindMask {
        kinds.iter().fold(KindMask::NONE, |mask, &kind| mask.with(kind))
    }

    /// Is `kind` in the set?
    pub const fn contains(self, kind: ValueKind) -> bool {
        self.0 & (1 << kind as u8) != 0
    }
}

impl Default for KindMask {
    fn default() -> Self {
        KindMask::ALL
    }
}
