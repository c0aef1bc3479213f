use crate::error::{malformed_error, Error, Result};
use crate::oop_map::stream::OopMapStream;
use crate::oop_map::OopMap;
use crate::root_enumerator::{enumerate, FrameRoot, FrameRoots};
use crate::util::Address;
use crate::vm::FrameConvention;

/// The oop maps of one compiled method, ordered by pc offset.
///
/// This is what a collector consults when a stack walk stops in compiled code: the pc of the
/// frame, relative to the method's code start, selects the map describing the frame's roots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OopMapSet<'a> {
    maps: Vec<OopMap<'a>>,
}

impl<'a> OopMapSet<'a> {
    /// Collect `maps` into a set. The maps may come in any order.
    ///
    /// # Errors
    /// [`Error::Malformed`] if two maps claim the same pc offset.
    pub fn new(mut maps: Vec<OopMap<'a>>) -> Result<Self> {
        maps.sort_by_key(OopMap::pc_offset);
        if let Some(pair) = maps
            .windows(2)
            .find(|pair| pair[0].pc_offset() == pair[1].pc_offset())
        {
            return Err(malformed_error!("two oop maps at pc offset {:#x}", pair[0].pc_offset()));
        }
        Ok(OopMapSet { maps })
    }

    /// Number of maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Does the method have no safepoints?
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// The maps, in pc order.
    pub fn iter(&self) -> impl Iterator<Item = &OopMap<'a>> + '_ {
        self.maps.iter()
    }

    /// The map recorded for exactly `pc_offset`.
    ///
    /// # Errors
    /// [`Error::NoOopMapAtOffset`] if the pc is not a safepoint of this method.
    pub fn find_map_at_offset(&self, pc_offset: u32) -> Result<&OopMap<'a>> {
        self.maps
            .binary_search_by_key(&pc_offset, OopMap::pc_offset)
            .map(|index| &self.maps[index])
            .map_err(|_| Error::NoOopMapAtOffset(pc_offset))
    }

    /// The roots of the frame based at `frame_base` that is stopped at `pc_offset`, in the order
    /// the compiler recorded them.
    ///
    /// Roots are produced lazily; a decoding error shows up as an `Err` item and ends the
    /// sequence. Collect into a `Result<Vec<_>>` to get all roots or the error.
    ///
    /// # Errors
    /// [`Error::NoOopMapAtOffset`] if the pc is not a safepoint of this method.
    pub fn enumerate_roots(
        &self,
        pc_offset: u32,
        frame_base: Address,
        convention: FrameConvention,
    ) -> Result<FrameRoots<OopMapStream<'a>>> {
        let map = self.find_map_at_offset(pc_offset)?;
        debug!(
            "enumerating {} values at pc offset {:#x} for frame {}",
            map.omv_count(),
            pc_offset,
            frame_base
        );
        Ok(enumerate(frame_base, map.iter(), convention))
    }

    /// Like [`Self::enumerate_roots`], but all roots or none.
    ///
    /// # Errors
    /// [`Error::NoOopMapAtOffset`] or the first decoding error.
    pub fn collect_roots(
        &self,
        pc_offset: u32,
        frame_base: Address,
        convention: FrameConvention,
    ) -> Result<Vec<FrameRoot>> {
        self.enumerate_roots(pc_offset, frame_base, convention)?.collect()
    }
}
