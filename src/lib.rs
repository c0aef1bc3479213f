//! Decoding of compressed oop maps, and enumeration of the garbage collection roots they
//! describe in stopped compiled frames.
//!
//! A compiler records, for every pc at which a thread may stop for a collection, which stack
//! slots and registers of the frame hold references. This crate reads that record:
//!
//! * [`util::compressed_stream`] decodes the variable-length integers the record is made of.
//! * [`OopMap`] is a borrowed view of one record. [`OopMapStream`] decodes its values in order,
//!   and the whole table is validated against its declared count.
//! * [`OopMapSet`] holds the maps of one method and finds the one for a pc. [`OopMapReader`]
//!   reads sets out of metadata images whose byte layout is given by an [`OopMapLayout`].
//! * [`enumerate`], [`collect_roots`] and [`scan_frame`] turn the values into [`FrameRoot`]s:
//!   concrete addresses for stack slots, register identifiers for registers.
//!
//! The crate never reads or writes the memory of the inspected process. It computes addresses;
//! dereferencing them is the caller's job.
//!
//! The [`OopMapBuilder`] and [`OopMapSetWriter`] produce the same formats, for emitters and for
//! tests.

#[macro_use]
extern crate log;

mod error;
/// Oop maps and their values.
pub mod oop_map;
mod root_enumerator;
/// Utilities shared by the decoder and the enumerator.
pub mod util;
/// The target machine.
pub mod vm;

pub use crate::error::{Error, Result};
pub use crate::oop_map::layout::OopMapLayout;
pub use crate::oop_map::reader::OopMapReader;
pub use crate::oop_map::set::OopMapSet;
pub use crate::oop_map::writer::OopMapSetWriter;
pub use crate::oop_map::{
    KindMask, Location, OopMap, OopMapBuf, OopMapBuilder, OopMapStream, OopMapValue, ValueKind,
};
pub use crate::root_enumerator::{
    collect_roots, enumerate, scan_frame, FrameRoot, FrameRoots, RootSlot,
};
pub use crate::util::options::Options;
pub use crate::util::Address;
pub use crate::vm::{FrameConvention, Register, RegisterMap, RootVisitor};

/// Initialize the built-in logger, if the `builtin_env_logger` feature is enabled.
///
/// Applications that install their own `log` backend should not call this. Calling it more
/// than once is harmless; later calls only log that a logger is already present.
pub fn init_logger() {
    match crate::util::logger::try_init() {
        Ok(()) => debug!("oopmap logger initialized"),
        Err(e) => debug!("oopmap logger not initialized: {}", e),
    }
}
