//! Writing oop map images, the inverse of [`crate::OopMapReader`].

use crate::error::{malformed_error, Result};
use crate::oop_map::layout::OopMapLayout;
use crate::oop_map::OopMapBuf;
use crate::util::constants::BYTES_IN_INT;
use crate::util::conversions::{raw_align_up, raw_is_aligned};

/// Lays out finished oop maps as an image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OopMapSetWriter {
    layout: OopMapLayout,
}

impl OopMapSetWriter {
    /// A writer producing records in `layout`.
    pub fn new(layout: OopMapLayout) -> Self {
        OopMapSetWriter { layout }
    }

    fn put_u32(image: &mut [u8], offset: usize, value: u32) {
        image[offset..offset + BYTES_IN_INT].copy_from_slice(&value.to_le_bytes());
    }

    /// Write `maps` as one image. The maps are written sorted by pc offset; gaps and padding
    /// are zero.
    ///
    /// # Errors
    /// [`crate::Error::Malformed`] if two maps share a pc offset, or a count or size does not
    /// fit its `u32` field.
    pub fn write(&self, maps: &[OopMapBuf]) -> Result<Vec<u8>> {
        let mut sorted: Vec<&OopMapBuf> = maps.iter().collect();
        sorted.sort_by_key(|map| map.pc_offset());
        if let Some(pair) = sorted
            .windows(2)
            .find(|pair| pair[0].pc_offset() == pair[1].pc_offset())
        {
            return Err(malformed_error!("two oop maps at pc offset {:#x}", pair[0].pc_offset()));
        }

        let map_count = u32::try_from(sorted.len())
            .map_err(|_| malformed_error!("{} oop maps do not fit an image", sorted.len()))?;
        let alignment = self.layout.record_alignment();
        let mut image = map_count.to_le_bytes().to_vec();
        image.resize(raw_align_up(image.len(), alignment), 0);

        for map in sorted {
            let data = map.omv_data();
            let omv_data_size = u32::try_from(data.len()).map_err(|_| {
                malformed_error!(
                    "oop map at pc offset {:#x} has {} bytes of data",
                    map.pc_offset(),
                    data.len()
                )
            })?;
            let at = image.len();
            image.resize(at + self.layout.omv_data(), 0);
            Self::put_u32(&mut image, at + self.layout.pc_offset(), map.pc_offset());
            Self::put_u32(&mut image, at + self.layout.omv_count(), map.omv_count());
            Self::put_u32(&mut image, at + self.layout.omv_data_size(), omv_data_size);
            image.extend_from_slice(data);
            image.resize(raw_align_up(image.len(), alignment), 0);
            debug_assert!(raw_is_aligned(image.len(), alignment));
        }
        debug!("wrote {} oop maps into {} bytes", map_count, image.len());
        Ok(image)
    }
}
