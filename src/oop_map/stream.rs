use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::oop_map::value::{KindMask, OopMapValue};
use crate::util::compressed_stream::CompressedReadStream;

/// Decodes the values of one oop map, in the order the compiler emitted them.
///
/// The stream is lazy and forward-only. It holds a private cursor, so any number of streams
/// may decode the same bytes concurrently; to start over, make a new stream.
///
/// Every byte of the table is validated even when a [`KindMask`] hides some entries: the
/// declared count must consume the data exactly. The first error ends the stream.
#[derive(Debug, Clone)]
pub struct OopMapStream<'a> {
    reader: CompressedReadStream<'a>,
    declared: usize,
    decoded: usize,
    mask: KindMask,
    done: bool,
}

impl<'a> OopMapStream<'a> {
    /// Decode `count` values from `data`.
    pub fn new(data: &'a [u8], count: usize) -> Self {
        Self::with_mask(data, count, KindMask::ALL)
    }

    /// Decode `count` values from `data`, yielding only those whose kind is in `mask`.
    pub fn with_mask(data: &'a [u8], count: usize, mask: KindMask) -> Self {
        OopMapStream {
            reader: CompressedReadStream::new(data),
            declared: count,
            decoded: 0,
            mask,
            done: false,
        }
    }

    /// How many values have been decoded so far, including ones hidden by the mask.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Byte offset of the next value.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    fn fail(&mut self, error: Error) -> Option<Result<OopMapValue>> {
        self.done = true;
        Some(Err(error))
    }

    fn count_mismatch(&self, trailing: usize) -> Error {
        Error::OmvCountMismatch {
            declared: self.declared,
            decoded: self.decoded,
            trailing,
        }
    }
}

impl Iterator for OopMapStream<'_> {
    type Item = Result<OopMapValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if self.decoded == self.declared {
                self.done = true;
                if !self.reader.is_at_end() {
                    let error = self.count_mismatch(self.reader.remaining());
                    return self.fail(error);
                }
                return None;
            }

            let entry_start = self.reader.position();
            let end = entry_start + self.reader.remaining();
            match OopMapValue::read_from(&mut self.reader) {
                Ok(value) => {
                    self.decoded += 1;
                    trace!("omv #{} at byte {}: {}", self.decoded, entry_start, value);
                    if self.mask.contains(value.kind()) {
                        return Some(Ok(value));
                    }
                }
                // The data ran out between two fields: a short table, not a broken integer.
                Err(Error::MalformedEncoding { offset }) if offset == end => {
                    let error = self.count_mismatch(end - entry_start);
                    return self.fail(error);
                }
                Err(error) => return self.fail(error),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            // One extra item for a trailing-bytes error.
            (0, (self.declared - self.decoded).checked_add(1))
        }
    }
}

impl FusedIterator for OopMapStream<'_> {}
