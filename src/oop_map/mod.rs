//! Oop maps: the compiler's record of where live references are at one pc.
//!
//! A compiled method carries one [`OopMap`] per pc at which a thread may stop for garbage
//! collection. The map is an ordered table of [`OopMapValue`]s, stored compressed. This module
//! has the read-only view over finalized map data ([`OopMap`]), the construction-time builder
//! ([`OopMapBuilder`]), and the owned record it produces ([`OopMapBuf`]).

pub mod layout;
pub mod reader;
pub mod set;
pub mod stream;
pub mod value;
pub mod writer;

use std::fmt;

use enum_map::EnumMap;
use itertools::Itertools;

use crate::error::Result;
use crate::util::compressed_stream::CompressedWriteStream;
use crate::util::ByteOffset;
use crate::vm::Register;

pub use self::stream::OopMapStream;
pub use self::value::{KindMask, Location, OopMapValue, ValueKind};

/// The live-reference metadata for one pc offset of a compiled method.
///
/// An `OopMap` never owns its data. The bytes belong to the compiled method's metadata, and the
/// view is only valid while that method is alive; the borrow checker holds callers to that. The
/// map is immutable, so any number of threads may decode it at once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OopMap<'a> {
    pc_offset: u32,
    omv_count: u32,
    omv_data: &'a [u8],
}

impl<'a> OopMap<'a> {
    /// A view of `omv_count` values encoded in `omv_data`, for the safepoint at `pc_offset`.
    ///
    /// Nothing is decoded here. Use [`OopMap::validate`] to check the data eagerly.
    pub fn new(pc_offset: u32, omv_count: u32, omv_data: &'a [u8]) -> Self {
        OopMap {
            pc_offset,
            omv_count,
            omv_data,
        }
    }

    /// Offset of the safepoint from the start of the method's code.
    pub fn pc_offset(&self) -> u32 {
        self.pc_offset
    }

    /// Declared number of values.
    pub fn omv_count(&self) -> u32 {
        self.omv_count
    }

    /// Size in bytes of the encoded values.
    pub fn omv_data_size(&self) -> usize {
        self.omv_data.len()
    }

    /// The encoded values.
    pub fn omv_data(&self) -> &'a [u8] {
        self.omv_data
    }

    /// Decode every value, in order.
    pub fn iter(&self) -> OopMapStream<'a> {
        OopMapStream::new(self.omv_data, self.omv_count as usize)
    }

    /// Decode every value, yielding only those whose kind is in `mask`.
    pub fn with_mask(&self, mask: KindMask) -> OopMapStream<'a> {
        OopMapStream::with_mask(self.omv_data, self.omv_count as usize, mask)
    }

    /// Decode all values into a vector.
    ///
    /// # Errors
    /// The first decoding error; no values are returned in that case.
    pub fn values(&self) -> Result<Vec<OopMapValue>> {
        self.iter().collect()
    }

    /// Decode the whole map and discard the values.
    ///
    /// # Errors
    /// The first decoding error.
    pub fn validate(&self) -> Result<()> {
        self.iter().try_for_each(|value| value.map(drop))
    }

    /// Number of values of each kind.
    ///
    /// # Errors
    /// The first decoding error.
    pub fn count_by_kind(&self) -> Result<EnumMap<ValueKind, usize>> {
        self.iter().try_fold(EnumMap::default(), |mut counts, value| {
            counts[value?.kind()] += 1;
            Ok(counts)
        })
    }

    /// Does the map hold any derived pointers? A collector that moves objects has to fix those
    /// up after the bases have moved.
    ///
    /// # Errors
    /// The first decoding error.
    pub fn has_derived_oops(&self) -> Result<bool> {
        Ok(self.count_by_kind()?[ValueKind::Derived] > 0)
    }
}

impl<'a> IntoIterator for &OopMap<'a> {
    type Item = Result<OopMapValue>;
    type IntoIter = OopMapStream<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Prints `OopMap{pc=0x40 [Oop(stack[8]) NarrowOop(R3)]}`. A value that fails to decode is
/// printed as `<error>` and ends the list.
impl fmt::Display for OopMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let values = self.iter().map(|value| match value {
            Ok(value) => value.to_string(),
            Err(e) => format!("<{}>", e),
        });
        write!(f, "OopMap{{pc={:#x} [{}]}}", self.pc_offset, values.format(" "))
    }
}

/// Builds the oop map of one safepoint while its code is being emitted.
///
/// The write stream only exists once the first value is recorded, so a safepoint without live
/// references never allocates. [`OopMapBuilder::finish`] consumes the builder; a finished map
/// never carries a write stream.
#[derive(Debug, Clone)]
pub struct OopMapBuilder {
    pc_offset: u32,
    omv_count: u32,
    write_stream: Option<CompressedWriteStream>,
}

impl OopMapBuilder {
    /// Start the map for the safepoint at `pc_offset`.
    pub fn new(pc_offset: u32) -> Self {
        OopMapBuilder {
            pc_offset,
            omv_count: 0,
            write_stream: None,
        }
    }

    /// Number of values recorded so far.
    pub fn omv_count(&self) -> u32 {
        self.omv_count
    }

    /// Record `value` after the values already recorded.
    pub fn push(&mut self, value: OopMapValue) -> &mut Self {
        let stream = self.write_stream.get_or_insert_with(CompressedWriteStream::new);
        value.write_to(stream);
        self.omv_count += 1;
        self
    }

    /// Record a full-width reference at `location`.
    pub fn set_oop(&mut self, location: Location) -> &mut Self {
        self.push(OopMapValue::Oop(location))
    }

    /// Record a narrow reference at `location`.
    pub fn set_narrow_oop(&mut self, location: Location) -> &mut Self {
        self.push(OopMapValue::NarrowOop(location))
    }

    /// Record that `location` holds the caller's value of `saved`.
    pub fn set_callee_saved(&mut self, location: Location, saved: Register) -> &mut Self {
        self.push(OopMapValue::CalleeSaved { location, saved })
    }

    /// Record a pointer `offset` bytes past the reference held at `base`.
    pub fn set_derived_oop(&mut self, base: Location, offset: ByteOffset) -> &mut Self {
        self.push(OopMapValue::Derived { base, offset })
    }

    /// Record that `location` is dead.
    pub fn set_dead(&mut self, location: Location) -> &mut Self {
        self.push(OopMapValue::Dead(location))
    }

    /// Seal the map.
    pub fn finish(self) -> OopMapBuf {
        let omv_data = self
            .write_stream
            .map(CompressedWriteStream::into_bytes)
            .unwrap_or_default();
        debug!(
            "finished oop map at pc {:#x}: {} values in {} bytes",
            self.pc_offset,
            self.omv_count,
            omv_data.len()
        );
        OopMapBuf {
            pc_offset: self.pc_offset,
            omv_count: self.omv_count,
            omv_data,
        }
    }
}

/// A finished oop map that owns its data, as the compiled method's metadata would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OopMapBuf {
    pc_offset: u32,
    omv_count: u32,
    omv_data: Vec<u8>,
}

impl OopMapBuf {
    /// Encode `values` as the map of the safepoint at `pc_offset`.
    pub fn from_values<I: IntoIterator<Item = OopMapValue>>(pc_offset: u32, values: I) -> Self {
        let mut builder = OopMapBuilder::new(pc_offset);
        for value in values {
            builder.push(value);
        }
        builder.finish()
    }

    /// Borrow the map.
    pub fn as_oop_map(&self) -> OopMap<'_> {
        OopMap::new(self.pc_offset, self.omv_count, &self.omv_data)
    }

    /// Offset of the safepoint.
    pub fn pc_offset(&self) -> u32 {
        self.pc_offset
    }

    /// Number of values.
    pub fn omv_count(&self) -> u32 {
        self.omv_count
    }

    /// The encoded values.
    pub fn omv_data(&self) -> &[u8] {
        &self.omv_data
    }
}
