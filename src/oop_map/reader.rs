//! Reading oop maps out of a metadata image.
//!
//! An image is what a compiled method's oop map set looks like in memory, or in a core file: a
//! little-endian `u32` map count, then one record per map laid out as [`OopMapLayout`] says,
//! starting at the first record boundary after the count. The reader borrows the image; the
//! maps it returns point straight into it.

use crate::error::{malformed_error, Error, Result};
use crate::oop_map::layout::OopMapLayout;
use crate::oop_map::set::OopMapSet;
use crate::oop_map::{OopMap, ValueKind};
use crate::util::constants::BYTES_IN_INT;
use crate::util::conversions::checked_align_up;
use crate::util::options::{Options, DEFAULT_MAX_OMV_COUNT};

/// Read a little-endian `u32` at `offset`.
fn read_u32(image: &[u8], offset: usize) -> Result<u32> {
    let out_of_bounds = Error::OutOfBounds {
        offset,
        len: image.len(),
    };
    let end = offset.checked_add(BYTES_IN_INT).ok_or(out_of_bounds.clone())?;
    let bytes = image.get(offset..end).ok_or(out_of_bounds)?;
    Ok(u32::from_le(bytemuck::pod_read_unaligned(bytes)))
}

/// Reads oop map records from images with one fixed layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OopMapReader {
    layout: OopMapLayout,
    max_omv_count: usize,
    reject_dead_values: bool,
}

impl OopMapReader {
    /// A reader for `layout` with the default limits.
    pub fn new(layout: OopMapLayout) -> Self {
        OopMapReader {
            layout,
            max_omv_count: DEFAULT_MAX_OMV_COUNT,
            reject_dead_values: false,
        }
    }

    /// A reader for `layout` with the limits in `options`.
    pub fn with_options(layout: OopMapLayout, options: &Options) -> Self {
        OopMapReader {
            layout,
            max_omv_count: options.max_omv_count,
            reject_dead_values: options.reject_dead_values,
        }
    }

    /// The record layout this reader expects.
    pub fn layout(&self) -> &OopMapLayout {
        &self.layout
    }

    /// Where the first record of an image starts.
    fn first_record(&self) -> Result<usize> {
        checked_align_up(BYTES_IN_INT, self.layout.record_alignment())
            .ok_or_else(|| malformed_error!("no record fits after the map count"))
    }

    /// Read the record at byte `at` of `image`. Returns the map and the offset where the next
    /// record would start.
    ///
    /// The map's values are decoded once here, so a map returned by the reader is known to be
    /// well formed.
    ///
    /// # Errors
    /// * [`Error::OutOfBounds`] if the header or the data runs past the end of the image.
    /// * [`Error::Malformed`] if the declared count exceeds the configured maximum, or the map
    ///   holds dead values and the reader rejects them.
    /// * Any decoding error of the values.
    pub fn read_map<'a>(&self, image: &'a [u8], at: usize) -> Result<(OopMap<'a>, usize)> {
        let field = |offset: usize| {
            at.checked_add(offset)
                .ok_or(Error::OutOfBounds {
                    offset: at,
                    len: image.len(),
                })
                .and_then(|offset| read_u32(image, offset))
        };
        let pc_offset = field(self.layout.pc_offset())?;
        let omv_count = field(self.layout.omv_count())?;
        let omv_data_size = field(self.layout.omv_data_size())? as usize;

        if omv_count as usize > self.max_omv_count {
            return Err(malformed_error!(
                "oop map at pc offset {:#x} declares {} values, more than the limit of {}",
                pc_offset,
                omv_count,
                self.max_omv_count
            ));
        }

        let start = at.checked_add(self.layout.omv_data());
        let end = start.and_then(|start| start.checked_add(omv_data_size));
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if end <= image.len() => (start, end),
            _ => {
                return Err(Error::OutOfBounds {
                    offset: start.unwrap_or(at),
                    len: image.len(),
                })
            }
        };

        let map = OopMap::new(pc_offset, omv_count, &image[start..end]);
        let counts = map.count_by_kind()?;
        if self.reject_dead_values && counts[ValueKind::Dead] > 0 {
            return Err(malformed_error!(
                "oop map at pc offset {:#x} holds {} dead values",
                pc_offset,
                counts[ValueKind::Dead]
            ));
        }
        trace!("read {} at byte {}", map, at);

        let next = checked_align_up(end, self.layout.record_alignment())
            .ok_or_else(|| malformed_error!("record at byte {} ends past the address space", at))?;
        Ok((map, next))
    }

    /// Read a whole image.
    ///
    /// # Errors
    /// Everything [`Self::read_map`] reports for any record, and [`Error::Malformed`] if the
    /// records are not in strictly increasing pc order.
    pub fn read_set<'a>(&self, image: &'a [u8]) -> Result<OopMapSet<'a>> {
        let map_count = read_u32(image, 0)? as usize;
        // Every record is at least a header long, so a corrupt count cannot make us allocate
        // more than the image could hold.
        let capacity = map_count.min(image.len() / self.layout.omv_data().max(1));
        let mut maps = Vec::with_capacity(capacity);

        let mut at = self.first_record()?;
        for _ in 0..map_count {
            let (map, next) = self.read_map(image, at)?;
            if let Some(previous) = maps.last().map(OopMap::pc_offset) {
                if map.pc_offset() <= previous {
                    return Err(malformed_error!(
                        "oop map at pc offset {:#x} follows pc offset {:#x}",
                        map.pc_offset(),
                        previous
                    ));
                }
            }
            maps.push(map);
            at = next;
        }
        debug!(
            "read {} oop maps from a {} byte image",
            maps.len(),
            image.len()
        );
        OopMapSet::new(maps)
    }
}

impl Default for OopMapReader {
    fn default() -> Self {
        OopMapReader::new(OopMapLayout::default())
    }
}
