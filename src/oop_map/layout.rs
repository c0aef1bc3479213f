//! Byte layout of an oop map record in a metadata image.
//!
//! The layout is a plain value handed to [`crate::OopMapReader::new`] and
//! [`crate::OopMapSetWriter::new`]. A serviceability tool fills it in from the target VM's type
//! database before reading anything; a collector built together with the emitter uses
//! [`OopMapLayout::default`].

use crate::error::{malformed_error, Result};
use crate::util::constants::BYTES_IN_INT;

/// Field offsets inside one record. All header fields are little-endian `u32`s. The encoded
/// values start at `omv_data` and run for `omv_data_size` bytes. Records are padded to
/// `record_alignment`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OopMapLayout {
    pc_offset: usize,
    omv_count: usize,
    omv_data_size: usize,
    omv_data: usize,
    record_alignment: usize,
}

impl OopMapLayout {
    /// Describe a record layout.
    ///
    /// # Errors
    /// [`crate::Error::Malformed`] if a header field overlaps another or extends into the
    /// data, or the alignment is not a power of two.
    pub fn new(
        pc_offset: usize,
        omv_count: usize,
        omv_data_size: usize,
        omv_data: usize,
        record_alignment: usize,
    ) -> Result<Self> {
        if !record_alignment.is_power_of_two() {
            return Err(malformed_error!(
                "record alignment {} is not a power of two",
                record_alignment
            ));
        }
        let mut fields = [pc_offset, omv_count, omv_data_size];
        fields.sort_unstable();
        for pair in fields.windows(2) {
            if pair[1] - pair[0] < BYTES_IN_INT {
                return Err(malformed_error!("overlapping header fields at {:?}", fields));
            }
        }
        match fields[2].checked_add(BYTES_IN_INT) {
            Some(end) if end <= omv_data => {}
            _ => {
                return Err(malformed_error!(
                    "header fields {:?} run into the data at {}",
                    fields,
                    omv_data
                ))
            }
        }
        Ok(OopMapLayout {
            pc_offset,
            omv_count,
            omv_data_size,
            omv_data,
            record_alignment,
        })
    }

    /// Offset of the `pc_offset` field.
    pub fn pc_offset(&self) -> usize {
        self.pc_offset
    }

    /// Offset of the `omv_count` field.
    pub fn omv_count(&self) -> usize {
        self.omv_count
    }

    /// Offset of the `omv_data_size` field.
    pub fn omv_data_size(&self) -> usize {
        self.omv_data_size
    }

    /// Offset of the first encoded byte, which is also the header size.
    pub fn omv_data(&self) -> usize {
        self.omv_data
    }

    /// Alignment of each record.
    pub fn record_alignment(&self) -> usize {
        self.record_alignment
    }
}

/// `{ pc_offset: u32, omv_count: u32, omv_data_size: u32, omv_data: [u8] }`, 4-byte aligned.
impl Default for OopMapLayout {
    fn default() -> Self {
        OopMapLayout {
            pc_offset: 0,
            omv_count: BYTES_IN_INT,
            omv_data_size: 2 * BYTES_IN_INT,
            omv_data: 3 * BYTES_IN_INT,
            record_alignment: BYTES_IN_INT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let default = OopMapLayout::default();
        assert_eq!(OopMapLayout::new(0, 4, 8, 12, 4), Ok(default));
    }

    #[test]
    fn reordered_fields() {
        let layout = OopMapLayout::new(8, 0, 4, 16, 8).unwrap();
        assert_eq!(layout.pc_offset(), 8);
        assert_eq!(layout.omv_count(), 0);
        assert_eq!(layout.omv_data_size(), 4);
        assert_eq!(layout.omv_data(), 16);
        assert_eq!(layout.record_alignment(), 8);
    }

    #[test]
    fn rejects_bad_layouts() {
        assert!(OopMapLayout::new(0, 2, 8, 12, 4).is_err());
        assert!(OopMapLayout::new(0, 4, 8, 10, 4).is_err());
        assert!(OopMapLayout::new(0, 4, 8, 12, 3).is_err());
        assert!(OopMapLayout::new(0, 4, usize::MAX, 12, 4).is_err());
    }
}
